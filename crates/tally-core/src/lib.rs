//! # tally-core: Pure Business Logic for the Tally Intent Bridge
//!
//! Everything the bridge decides without touching a store: types, money,
//! who may do what, how a typed product name becomes a search, and how
//! document numbers look.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tally Intent Bridge                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            NLU (upstream): chat text → (intent, entities)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ POST /v1/intents/execute               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    intent-api (axum)                            │   │
//! │  │    credential ─► authorizer ─► router ─► handlers ─► formatter  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   money   │  │product_query│  │ entities │  │   │
//! │  │   │  context  │  │  period   │  │  sanitize   │  │validation│  │   │
//! │  │   │  intent   │  │ sequence  │  │ permissions │  │  lookup  │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Store layer)                       │   │
//! │  │            PostgreSQL adapter, in-memory store, deadlines       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (InventoryItem, Sale, Expense, Task, ...)
//! - [`money`] - Money type with integer arithmetic and amount parsing
//! - [`error`] - Domain error types
//! - [`context`] - Execution context, unverified vs verified roles
//! - [`intent`] - The 20 intents
//! - [`permissions`] - Role → intent table
//! - [`sanitize`] - Input sanitizer and `LIKE` escaping
//! - [`product_query`] - Product query normalizer
//! - [`sequence`] - `PREFIX-YYYY-NNNN` document numbers
//! - [`entities`] - Entity bags and per-handler requests
//! - [`validation`] - Field validators
//! - [`lookup`] - Payment and expense synonym tables
//! - [`period`] - Reporting periods
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::product_query::normalize_product_query;
//! use tally_core::money::Money;
//!
//! let query = normalize_product_query("5 cmnt bgs").unwrap();
//! assert_eq!(query.pattern, "%cement%");
//!
//! let amount = Money::parse_amount("3,750").unwrap();
//! assert_eq!(amount.cents(), 375_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod context;
pub mod entities;
pub mod error;
pub mod intent;
pub mod lookup;
pub mod money;
pub mod period;
pub mod permissions;
pub mod product_query;
pub mod sanitize;
pub mod sequence;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use context::{AuthorizedContext, ExecutionContext, Role, UnverifiedRole, VerifiedRole};
pub use entities::Entities;
pub use error::{CoreError, CoreResult, ValidationError};
pub use intent::{Intent, UnknownIntent};
pub use money::Money;
pub use period::Period;
pub use product_query::ProductQuery;
pub use sequence::{DocumentSeries, SequenceNumber};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches a mistyped "1000" for "10" before any stock moves.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Customer name used when a sale names none.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";
