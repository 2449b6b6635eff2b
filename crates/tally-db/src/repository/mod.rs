//! # Repository Module
//!
//! PostgreSQL repositories behind [`crate::PgStore`].
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler                                                                │
//! │       │  store.search_inventory(tenant, "%cement%", 1)                  │
//! │       ▼                                                                 │
//! │  impl InventoryStore for PgStore   (one-line delegation)                │
//! │       │  self.inventory().search(tenant, pattern, limit)                │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                    │
//! │  ├── record struct (FromRow) ──► tally-core type                        │
//! │  └── SQL, always filtered by tenant_id                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`MembershipRepository`] - Tenant membership lookup
//! - [`InventoryRepository`] - Search, listing, atomic stock reservation
//! - [`SequenceRepository`] - Counter rows and recent document numbers
//! - [`SaleRepository`] - Headers, items, receipts, projection rows
//! - [`ExpenseRepository`] - Expense writes and period reads
//! - [`StaffRepository`] - Employees and attendance
//! - [`TaskRepository`] - Task writes and lookups

pub mod expense;
pub mod inventory;
pub mod membership;
pub mod sale;
pub mod sequence;
pub mod staff;
pub mod task;

pub use expense::ExpenseRepository;
pub use inventory::InventoryRepository;
pub use membership::MembershipRepository;
pub use sale::SaleRepository;
pub use sequence::SequenceRepository;
pub use staff::StaffRepository;
pub use task::TaskRepository;

use crate::PgStore;

impl PgStore {
    pub fn memberships(&self) -> MembershipRepository {
        MembershipRepository::new(self.pool().clone())
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool().clone())
    }

    pub fn sequences(&self) -> SequenceRepository {
        SequenceRepository::new(self.pool().clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool().clone())
    }

    pub fn expenses(&self) -> ExpenseRepository {
        ExpenseRepository::new(self.pool().clone())
    }

    pub fn staff(&self) -> StaffRepository {
        StaffRepository::new(self.pool().clone())
    }

    pub fn tasks(&self) -> TaskRepository {
        TaskRepository::new(self.pool().clone())
    }
}
