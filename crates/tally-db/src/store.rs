//! # Store Traits
//!
//! The seam between handlers and persistence.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Store                                      │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │ Membership   │ │  Inventory   │ │  Sequence    │ │    Sales     │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐                    │
//! │  │  Expense     │ │    Staff     │ │    Task      │   + ping()         │
//! │  └──────────────┘ └──────────────┘ └──────────────┘                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//!          ▲                    ▲                      ▲
//!       PgStore            MemoryStore          TimedStore<S> (deadline)
//! ```
//!
//! Every method takes `tenant_id` explicitly; implementations filter on it
//! for every row they touch.
//!
//! Patterns passed to the `search_*` methods are `LIKE` patterns already
//! escaped with `\`; implementations match them case-insensitively.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use tally_core::{
    AttendanceRecord, DocumentSeries, Employee, Expense, InventoryItem, Membership,
    PaymentReceipt, Sale, SaleItem, SalesTransaction, Task,
};

use crate::error::StoreResult;

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Membership row for the user in the tenant, active or not.
    async fn find_membership(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Membership>>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Items whose name or SKU matches `pattern`, ordered by name.
    async fn search_inventory(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<InventoryItem>>;

    /// First `limit` items ordered by name.
    async fn list_inventory(&self, tenant_id: &str, limit: i64) -> StoreResult<Vec<InventoryItem>>;

    /// Items with `current_stock <= reorder_level`, lowest stock first.
    async fn low_stock_items(&self, tenant_id: &str) -> StoreResult<Vec<InventoryItem>>;

    async fn get_inventory_item(&self, tenant_id: &str, item_id: &str) -> StoreResult<Option<InventoryItem>>;

    /// Atomically decrements stock iff at least `quantity` is available.
    ///
    /// Returns the remaining stock, or `None` when the item holds less than
    /// `quantity` (or does not exist). Never drives stock negative.
    async fn reserve_stock(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<Option<i64>>;

    /// Gives back a reservation.
    async fn release_stock(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Increments and returns the counter for the series in `year`
    /// (e.g. `SALE-2026`).
    ///
    /// The result is never below the highest number already issued for the
    /// series, so a counter created after numbers exist picks up from them.
    async fn next_sequence_value(&self, tenant_id: &str, series: DocumentSeries, year: i32) -> StoreResult<u32>;

    /// Most recently created document numbers starting with `number_prefix`
    /// (e.g. `SALE-2026-`), newest first.
    async fn recent_document_numbers(
        &self,
        tenant_id: &str,
        series: DocumentSeries,
        number_prefix: &str,
        limit: i64,
    ) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Fails with `UniqueViolation` when the sale number is taken.
    async fn insert_sale(&self, sale: &Sale) -> StoreResult<()>;

    async fn insert_sale_item(&self, item: &SaleItem) -> StoreResult<()>;

    /// Fails with `UniqueViolation` when the receipt number is taken.
    async fn insert_receipt(&self, receipt: &PaymentReceipt) -> StoreResult<()>;

    async fn insert_sales_transaction(&self, transaction: &SalesTransaction) -> StoreResult<()>;

    /// Sale headers created in `[from, to)`, oldest first.
    async fn sales_between(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Sale>>;

    /// Projection rows dated in `[from, to)`.
    async fn transactions_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesTransaction>>;

    async fn find_sale_by_number(&self, tenant_id: &str, sale_number: &str) -> StoreResult<Option<Sale>>;

    async fn latest_sale(&self, tenant_id: &str) -> StoreResult<Option<Sale>>;

    async fn sale_items(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Vec<SaleItem>>;

    async fn receipt_for_sale(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Option<PaymentReceipt>>;

    /// Sales whose customer name or phone matches `pattern`, newest first.
    async fn sales_for_customer(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<Sale>>;
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()>;

    /// Expenses incurred on dates in `[from, to)`.
    async fn expenses_between(&self, tenant_id: &str, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Expense>>;
}

#[async_trait]
pub trait StaffStore: Send + Sync {
    /// Active employee linked to the login.
    async fn employee_for_user(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Employee>>;

    /// Active employees ordered by name.
    async fn list_employees(&self, tenant_id: &str) -> StoreResult<Vec<Employee>>;

    /// Active employees whose name matches `pattern`.
    async fn search_employees(&self, tenant_id: &str, pattern: &str) -> StoreResult<Vec<Employee>>;

    /// The employee's shift without a clock-out, if any.
    async fn open_attendance(&self, tenant_id: &str, employee_id: &str) -> StoreResult<Option<AttendanceRecord>>;

    async fn insert_attendance(&self, record: &AttendanceRecord) -> StoreResult<()>;

    async fn close_attendance(
        &self,
        tenant_id: &str,
        record_id: &str,
        clock_out: DateTime<Utc>,
        hours_worked: f64,
    ) -> StoreResult<()>;

    /// Shifts that started in `[from, to)`, earliest first.
    async fn attendance_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AttendanceRecord>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> StoreResult<()>;

    /// Tasks not yet completed, optionally only those assigned to an employee.
    async fn open_tasks(&self, tenant_id: &str, assigned_to: Option<&str>) -> StoreResult<Vec<Task>>;

    /// Tasks whose title matches `pattern`, open ones first, optionally only
    /// those assigned to an employee.
    async fn search_tasks(
        &self,
        tenant_id: &str,
        pattern: &str,
        assigned_to: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<Task>>;

    async fn complete_task(&self, tenant_id: &str, task_id: &str, completed_at: DateTime<Utc>) -> StoreResult<()>;
}

/// Everything the bridge needs from persistence.
#[async_trait]
pub trait Store:
    MembershipStore + InventoryStore + SequenceStore + SalesStore + ExpenseStore + StaffStore + TaskStore
{
    /// Cheap round-trip used by `/health`.
    async fn ping(&self) -> StoreResult<()>;
}
