//! # tally-db: Store Layer for the Tally Intent Bridge
//!
//! Everything the bridge reads or writes goes through the [`Store`] trait
//! family defined here. Three implementations ship with the crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tally Intent Bridge Data Flow                      │
//! │                                                                         │
//! │  POST /v1/intents/execute → handler (record_sale, ...)                  │
//! │       │                                                                 │
//! │       ▼  Arc<dyn Store>                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  TimedStore   │───►│   PgStore     │    │ MemoryStore  │  │   │
//! │  │   │ (deadlines)   │    │ (pool.rs +    │    │ (tests, dev) │  │   │
//! │  │   │               │    │ repository/)  │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │   migrations (embedded)       │   │
//! │  └────────────────────────────────┼───────────────────────────────┘   │
//! │                                   ▼                                   │
//! │                            PostgreSQL                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The trait family handlers depend on
//! - [`pool`] - Connection pool and [`PgStore`]
//! - [`repository`] - SQL per aggregate, delegated to by [`PgStore`]
//! - [`migrations`] - Embedded schema migrations
//! - [`memory`] - In-process store with failure injection
//! - [`timed`] - Per-call deadline wrapper
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{DbConfig, PgStore, TimedStore, DEFAULT_STORE_TIMEOUT};
//!
//! let pg = PgStore::connect(DbConfig::new(url)).await?;
//! let store = TimedStore::new(pg, DEFAULT_STORE_TIMEOUT);
//!
//! let items = store.search_inventory(tenant_id, "%cement%", 1).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;
pub mod timed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use memory::{FailPoint, FailureKind, MemoryStore};
pub use pool::{DbConfig, PgStore};
pub use store::{
    ExpenseStore, InventoryStore, MembershipStore, SalesStore, SequenceStore, StaffStore, Store,
    TaskStore,
};
pub use timed::{TimedStore, DEFAULT_STORE_TIMEOUT};
