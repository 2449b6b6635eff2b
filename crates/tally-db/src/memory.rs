//! # In-Memory Store
//!
//! A [`Store`] held entirely in process, used by the test suites and by the
//! `memory` backend of the intent API for local runs.
//!
//! It enforces the same per-tenant uniqueness rules as the PostgreSQL
//! schema (sale numbers, receipt numbers, one open shift per employee) and
//! evaluates `LIKE` patterns with [`tally_core::sanitize::like_matches`].
//!
//! ## Failure Injection
//! ```text
//! store.fail(FailPoint::InsertReceipt, FailureKind::Query, 1)
//!        │
//!        ▼
//! next insert_receipt() ──► Err(StoreError::Query { .. })   (then normal)
//! ```
//!
//! Every call also bumps [`MemoryStore::call_count`], which lets tests prove
//! that a rejected request never reached the store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use tally_core::sanitize::like_matches;
use tally_core::sequence::next_from_recent;
use tally_core::{
    AttendanceRecord, DocumentSeries, Employee, Expense, InventoryItem, Membership,
    PaymentReceipt, Sale, SaleItem, SalesTransaction, Task, TaskStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    ExpenseStore, InventoryStore, MembershipStore, SalesStore, SequenceStore, StaffStore, Store,
    TaskStore,
};

/// Store call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Membership,
    SearchInventory,
    InsertSale,
    InsertSaleItem,
    InsertReceipt,
    InsertTransaction,
    InsertExpense,
    NextSequence,
}

impl FailPoint {
    fn operation(&self) -> &'static str {
        match self {
            FailPoint::Membership => "find_membership",
            FailPoint::SearchInventory => "search_inventory",
            FailPoint::InsertSale => "insert_sale",
            FailPoint::InsertSaleItem => "insert_sale_item",
            FailPoint::InsertReceipt => "insert_receipt",
            FailPoint::InsertTransaction => "insert_sales_transaction",
            FailPoint::InsertExpense => "insert_expense",
            FailPoint::NextSequence => "next_sequence_value",
        }
    }

    fn constraint(&self) -> &'static str {
        match self {
            FailPoint::InsertSale => SALE_NUMBER_KEY,
            FailPoint::InsertReceipt => RECEIPT_NUMBER_KEY,
            _ => "injected_unique",
        }
    }
}

/// What an injected failure looks like to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UniqueViolation,
    Query,
    Timeout,
}

const SALE_NUMBER_KEY: &str = "sales_tenant_sale_number_key";
const RECEIPT_NUMBER_KEY: &str = "payment_receipts_tenant_receipt_number_key";
const OPEN_SHIFT_KEY: &str = "idx_attendance_one_open";

#[derive(Debug, Clone, Copy)]
struct Failure {
    kind: FailureKind,
    remaining: u32,
}

#[derive(Debug, Default)]
struct State {
    memberships: Vec<Membership>,
    inventory: Vec<InventoryItem>,
    counters: HashMap<(String, String), u32>,
    sales: Vec<Sale>,
    sale_items: Vec<SaleItem>,
    receipts: Vec<PaymentReceipt>,
    transactions: Vec<SalesTransaction>,
    expenses: Vec<Expense>,
    employees: Vec<Employee>,
    attendance: Vec<AttendanceRecord>,
    tasks: Vec<Task>,
    failures: HashMap<FailPoint, Failure>,
}

impl State {
    /// Highest suffix already stored in the series for `year`, or 0.
    fn highest_issued(&self, tenant_id: &str, series: DocumentSeries, year: i32) -> u32 {
        let numbers: Vec<&str> = match series {
            DocumentSeries::Sale => self
                .sales
                .iter()
                .filter(|s| s.tenant_id == tenant_id)
                .map(|s| s.sale_number.as_str())
                .collect(),
            DocumentSeries::Receipt => self
                .receipts
                .iter()
                .filter(|r| r.tenant_id == tenant_id)
                .map(|r| r.receipt_number.as_str())
                .collect(),
        };
        next_from_recent(&numbers, series, year, 0) - 1
    }

    fn take_failure(&mut self, point: FailPoint) -> StoreResult<()> {
        let Some(failure) = self.failures.get_mut(&point) else {
            return Ok(());
        };
        failure.remaining = failure.remaining.saturating_sub(1);
        let kind = failure.kind;
        if failure.remaining == 0 {
            self.failures.remove(&point);
        }

        debug!(operation = point.operation(), ?kind, "Injected store failure");
        Err(match kind {
            FailureKind::UniqueViolation => StoreError::unique(point.constraint()),
            FailureKind::Query => StoreError::Query {
                code: "XX000".to_string(),
                message: format!("injected failure in {}", point.operation()),
            },
            FailureKind::Timeout => StoreError::Timeout {
                operation: point.operation(),
                after: Duration::ZERO,
            },
        })
    }
}

/// In-process [`Store`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn enter(&self) -> MutexGuard<'_, State> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().await
    }

    async fn enter_at(&self, point: FailPoint) -> StoreResult<MutexGuard<'_, State>> {
        let mut state = self.enter().await;
        state.take_failure(point)?;
        Ok(state)
    }

    // -------------------------------------------------------------------------
    // Test controls
    // -------------------------------------------------------------------------

    /// Makes the next `times` calls at `point` fail with `kind`.
    pub async fn fail(&self, point: FailPoint, kind: FailureKind, times: u32) {
        let mut state = self.state.lock().await;
        if times == 0 {
            state.failures.remove(&point);
        } else {
            state.failures.insert(point, Failure { kind, remaining: times });
        }
    }

    /// Number of store trait calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    pub async fn add_membership(&self, tenant_id: &str, user_id: &str, role: &str) {
        self.state.lock().await.memberships.push(Membership {
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            role: role.to_string(),
            is_active: true,
        });
    }

    pub async fn put_membership(&self, membership: Membership) {
        let mut state = self.state.lock().await;
        state
            .memberships
            .retain(|m| !(m.tenant_id == membership.tenant_id && m.user_id == membership.user_id));
        state.memberships.push(membership);
    }

    pub async fn add_inventory_item(&self, item: InventoryItem) {
        self.state.lock().await.inventory.push(item);
    }

    pub async fn add_employee(&self, employee: Employee) {
        self.state.lock().await.employees.push(employee);
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub async fn stock_of(&self, tenant_id: &str, item_id: &str) -> Option<i64> {
        self.state
            .lock()
            .await
            .inventory
            .iter()
            .find(|i| i.tenant_id == tenant_id && i.id == item_id)
            .map(|i| i.current_stock)
    }

    pub async fn sales(&self, tenant_id: &str) -> Vec<Sale> {
        let state = self.state.lock().await;
        state.sales.iter().filter(|s| s.tenant_id == tenant_id).cloned().collect()
    }

    pub async fn all_sale_items(&self, tenant_id: &str) -> Vec<SaleItem> {
        let state = self.state.lock().await;
        state.sale_items.iter().filter(|s| s.tenant_id == tenant_id).cloned().collect()
    }

    pub async fn receipts(&self, tenant_id: &str) -> Vec<PaymentReceipt> {
        let state = self.state.lock().await;
        state.receipts.iter().filter(|r| r.tenant_id == tenant_id).cloned().collect()
    }

    pub async fn transactions(&self, tenant_id: &str) -> Vec<SalesTransaction> {
        let state = self.state.lock().await;
        state.transactions.iter().filter(|t| t.tenant_id == tenant_id).cloned().collect()
    }

    pub async fn expenses(&self, tenant_id: &str) -> Vec<Expense> {
        let state = self.state.lock().await;
        state.expenses.iter().filter(|e| e.tenant_id == tenant_id).cloned().collect()
    }

    pub async fn attendance(&self, tenant_id: &str) -> Vec<AttendanceRecord> {
        let state = self.state.lock().await;
        state.attendance.iter().filter(|a| a.tenant_id == tenant_id).cloned().collect()
    }

    pub async fn tasks(&self, tenant_id: &str) -> Vec<Task> {
        let state = self.state.lock().await;
        state.tasks.iter().filter(|t| t.tenant_id == tenant_id).cloned().collect()
    }
}

fn by_name(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn clamp_limit(limit: i64) -> usize {
    usize::try_from(limit.max(0)).unwrap_or(usize::MAX)
}

// =============================================================================
// Store impls
// =============================================================================

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn find_membership(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Membership>> {
        let state = self.enter_at(FailPoint::Membership).await?;
        Ok(state
            .memberships
            .iter()
            .find(|m| m.tenant_id == tenant_id && m.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn search_inventory(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        let state = self.enter_at(FailPoint::SearchInventory).await?;
        let mut items: Vec<InventoryItem> = state
            .inventory
            .iter()
            .filter(|i| i.tenant_id == tenant_id)
            .filter(|i| {
                like_matches(pattern, &i.name)
                    || i.sku.as_deref().is_some_and(|sku| like_matches(pattern, sku))
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| by_name(&a.name, &b.name));
        items.truncate(clamp_limit(limit));
        Ok(items)
    }

    async fn list_inventory(&self, tenant_id: &str, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        let state = self.enter().await;
        let mut items: Vec<InventoryItem> =
            state.inventory.iter().filter(|i| i.tenant_id == tenant_id).cloned().collect();
        items.sort_by(|a, b| by_name(&a.name, &b.name));
        items.truncate(clamp_limit(limit));
        Ok(items)
    }

    async fn low_stock_items(&self, tenant_id: &str) -> StoreResult<Vec<InventoryItem>> {
        let state = self.enter().await;
        let mut items: Vec<InventoryItem> = state
            .inventory
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.is_low_stock())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.current_stock.cmp(&b.current_stock).then_with(|| by_name(&a.name, &b.name)));
        Ok(items)
    }

    async fn get_inventory_item(&self, tenant_id: &str, item_id: &str) -> StoreResult<Option<InventoryItem>> {
        let state = self.enter().await;
        Ok(state
            .inventory
            .iter()
            .find(|i| i.tenant_id == tenant_id && i.id == item_id)
            .cloned())
    }

    async fn reserve_stock(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<Option<i64>> {
        let mut state = self.enter().await;
        let Some(item) = state
            .inventory
            .iter_mut()
            .find(|i| i.tenant_id == tenant_id && i.id == item_id)
        else {
            return Ok(None);
        };
        if item.current_stock < quantity {
            return Ok(None);
        }
        item.current_stock -= quantity;
        Ok(Some(item.current_stock))
    }

    async fn release_stock(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<()> {
        let mut state = self.enter().await;
        if let Some(item) = state
            .inventory
            .iter_mut()
            .find(|i| i.tenant_id == tenant_id && i.id == item_id)
        {
            item.current_stock += quantity;
        }
        Ok(())
    }
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn next_sequence_value(&self, tenant_id: &str, series: DocumentSeries, year: i32) -> StoreResult<u32> {
        let mut state = self.enter_at(FailPoint::NextSequence).await?;
        let issued = state.highest_issued(tenant_id, series, year);
        let counter = state
            .counters
            .entry((tenant_id.to_string(), series.key(year)))
            .or_insert(0);
        *counter = (*counter + 1).max(issued + 1);
        Ok(*counter)
    }

    async fn recent_document_numbers(
        &self,
        tenant_id: &str,
        series: DocumentSeries,
        number_prefix: &str,
        limit: i64,
    ) -> StoreResult<Vec<String>> {
        let state = self.enter().await;
        let mut numbered: Vec<(DateTime<Utc>, String)> = match series {
            DocumentSeries::Sale => state
                .sales
                .iter()
                .filter(|s| s.tenant_id == tenant_id && s.sale_number.starts_with(number_prefix))
                .map(|s| (s.created_at, s.sale_number.clone()))
                .collect(),
            DocumentSeries::Receipt => state
                .receipts
                .iter()
                .filter(|r| r.tenant_id == tenant_id && r.receipt_number.starts_with(number_prefix))
                .map(|r| (r.created_at, r.receipt_number.clone()))
                .collect(),
        };
        numbered.sort_by(|a, b| b.cmp(a));
        Ok(numbered
            .into_iter()
            .take(clamp_limit(limit))
            .map(|(_, number)| number)
            .collect())
    }
}

#[async_trait]
impl SalesStore for MemoryStore {
    async fn insert_sale(&self, sale: &Sale) -> StoreResult<()> {
        let mut state = self.enter_at(FailPoint::InsertSale).await?;
        if state
            .sales
            .iter()
            .any(|s| s.tenant_id == sale.tenant_id && s.sale_number == sale.sale_number)
        {
            return Err(StoreError::unique(SALE_NUMBER_KEY));
        }
        state.sales.push(sale.clone());
        Ok(())
    }

    async fn insert_sale_item(&self, item: &SaleItem) -> StoreResult<()> {
        let mut state = self.enter_at(FailPoint::InsertSaleItem).await?;
        state.sale_items.push(item.clone());
        Ok(())
    }

    async fn insert_receipt(&self, receipt: &PaymentReceipt) -> StoreResult<()> {
        let mut state = self.enter_at(FailPoint::InsertReceipt).await?;
        if state
            .receipts
            .iter()
            .any(|r| r.tenant_id == receipt.tenant_id && r.receipt_number == receipt.receipt_number)
        {
            return Err(StoreError::unique(RECEIPT_NUMBER_KEY));
        }
        state.receipts.push(receipt.clone());
        Ok(())
    }

    async fn insert_sales_transaction(&self, transaction: &SalesTransaction) -> StoreResult<()> {
        let mut state = self.enter_at(FailPoint::InsertTransaction).await?;
        state.transactions.push(transaction.clone());
        Ok(())
    }

    async fn sales_between(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Sale>> {
        let state = self.enter().await;
        let mut sales: Vec<Sale> = state
            .sales
            .iter()
            .filter(|s| s.tenant_id == tenant_id && s.created_at >= from && s.created_at < to)
            .cloned()
            .collect();
        sales.sort_by_key(|s| s.created_at);
        Ok(sales)
    }

    async fn transactions_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesTransaction>> {
        let state = self.enter().await;
        let mut rows: Vec<SalesTransaction> = state
            .transactions
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.transaction_date >= from && t.transaction_date < to)
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.transaction_date);
        Ok(rows)
    }

    async fn find_sale_by_number(&self, tenant_id: &str, sale_number: &str) -> StoreResult<Option<Sale>> {
        let state = self.enter().await;
        Ok(state
            .sales
            .iter()
            .find(|s| s.tenant_id == tenant_id && s.sale_number == sale_number)
            .cloned())
    }

    async fn latest_sale(&self, tenant_id: &str) -> StoreResult<Option<Sale>> {
        let state = self.enter().await;
        Ok(state
            .sales
            .iter()
            .filter(|s| s.tenant_id == tenant_id)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.sale_number.cmp(&b.sale_number))
            })
            .cloned())
    }

    async fn sale_items(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Vec<SaleItem>> {
        let state = self.enter().await;
        Ok(state
            .sale_items
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.sale_id == sale_id)
            .cloned()
            .collect())
    }

    async fn receipt_for_sale(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Option<PaymentReceipt>> {
        let state = self.enter().await;
        Ok(state
            .receipts
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.sale_id.as_deref() == Some(sale_id))
            .min_by_key(|r| r.created_at)
            .cloned())
    }

    async fn sales_for_customer(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<Sale>> {
        let state = self.enter().await;
        let mut sales: Vec<Sale> = state
            .sales
            .iter()
            .filter(|s| s.tenant_id == tenant_id)
            .filter(|s| {
                like_matches(pattern, &s.customer_name)
                    || s.customer_phone.as_deref().is_some_and(|p| like_matches(pattern, p))
            })
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sales.truncate(clamp_limit(limit));
        Ok(sales)
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()> {
        let mut state = self.enter_at(FailPoint::InsertExpense).await?;
        state.expenses.push(expense.clone());
        Ok(())
    }

    async fn expenses_between(&self, tenant_id: &str, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Expense>> {
        let state = self.enter().await;
        let mut expenses: Vec<Expense> = state
            .expenses
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.date_incurred >= from && e.date_incurred < to)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| (e.date_incurred, e.created_at));
        Ok(expenses)
    }
}

#[async_trait]
impl StaffStore for MemoryStore {
    async fn employee_for_user(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Employee>> {
        let state = self.enter().await;
        Ok(state
            .employees
            .iter()
            .find(|e| e.tenant_id == tenant_id && e.is_active && e.user_id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn list_employees(&self, tenant_id: &str) -> StoreResult<Vec<Employee>> {
        let state = self.enter().await;
        let mut employees: Vec<Employee> = state
            .employees
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.is_active)
            .cloned()
            .collect();
        employees.sort_by(|a, b| by_name(&a.full_name, &b.full_name));
        Ok(employees)
    }

    async fn search_employees(&self, tenant_id: &str, pattern: &str) -> StoreResult<Vec<Employee>> {
        let state = self.enter().await;
        let mut employees: Vec<Employee> = state
            .employees
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.is_active && like_matches(pattern, &e.full_name))
            .cloned()
            .collect();
        employees.sort_by(|a, b| by_name(&a.full_name, &b.full_name));
        Ok(employees)
    }

    async fn open_attendance(&self, tenant_id: &str, employee_id: &str) -> StoreResult<Option<AttendanceRecord>> {
        let state = self.enter().await;
        Ok(state
            .attendance
            .iter()
            .filter(|a| a.tenant_id == tenant_id && a.employee_id == employee_id && a.is_open())
            .max_by_key(|a| a.clock_in)
            .cloned())
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        let mut state = self.enter().await;
        if record.is_open()
            && state.attendance.iter().any(|a| {
                a.tenant_id == record.tenant_id && a.employee_id == record.employee_id && a.is_open()
            })
        {
            return Err(StoreError::unique(OPEN_SHIFT_KEY));
        }
        state.attendance.push(record.clone());
        Ok(())
    }

    async fn close_attendance(
        &self,
        tenant_id: &str,
        record_id: &str,
        clock_out: DateTime<Utc>,
        hours_worked: f64,
    ) -> StoreResult<()> {
        let mut state = self.enter().await;
        if let Some(record) = state
            .attendance
            .iter_mut()
            .find(|a| a.tenant_id == tenant_id && a.id == record_id && a.is_open())
        {
            record.clock_out = Some(clock_out);
            record.hours_worked = Some(hours_worked);
        }
        Ok(())
    }

    async fn attendance_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let state = self.enter().await;
        let mut records: Vec<AttendanceRecord> = state
            .attendance
            .iter()
            .filter(|a| a.tenant_id == tenant_id && a.clock_in >= from && a.clock_in < to)
            .cloned()
            .collect();
        records.sort_by_key(|a| a.clock_in);
        Ok(records)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        let mut state = self.enter().await;
        state.tasks.push(task.clone());
        Ok(())
    }

    async fn open_tasks(&self, tenant_id: &str, assigned_to: Option<&str>) -> StoreResult<Vec<Task>> {
        let state = self.enter().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.status != TaskStatus::Completed)
            .filter(|t| assigned_to.map_or(true, |who| t.assigned_to.as_deref() == Some(who)))
            .cloned()
            .collect();
        // due date first, undated last
        tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date, t.created_at));
        Ok(tasks)
    }

    async fn search_tasks(
        &self,
        tenant_id: &str,
        pattern: &str,
        assigned_to: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<Task>> {
        let state = self.enter().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.tenant_id == tenant_id && like_matches(pattern, &t.title))
            .filter(|t| assigned_to.map_or(true, |who| t.assigned_to.as_deref() == Some(who)))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            (a.status == TaskStatus::Completed)
                .cmp(&(b.status == TaskStatus::Completed))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        tasks.truncate(clamp_limit(limit));
        Ok(tasks)
    }

    async fn complete_task(&self, tenant_id: &str, task_id: &str, completed_at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.enter().await;
        if let Some(task) = state
            .tasks
            .iter_mut()
            .find(|t| t.tenant_id == tenant_id && t.id == task_id)
        {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(completed_at);
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{new_id, PaymentMethod};

    fn sale(tenant: &str, number: &str) -> Sale {
        Sale {
            id: new_id(),
            tenant_id: tenant.to_string(),
            sale_number: number.to_string(),
            customer_name: "Walk-in Customer".to_string(),
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            subtotal_cents: 50_000,
            total_cents: 50_000,
            notes: None,
            created_by: "u1".to_string(),
            created_at: Utc::now(),
        }
    }

    fn item(tenant: &str, name: &str, stock: i64) -> InventoryItem {
        InventoryItem {
            id: new_id(),
            tenant_id: tenant.to_string(),
            name: name.to_string(),
            sku: None,
            current_stock: stock,
            reorder_level: 2,
            unit_price_cents: 10_000,
            liters_per_unit: None,
        }
    }

    #[tokio::test]
    async fn test_reserve_never_goes_negative() {
        let store = MemoryStore::new();
        let cement = item("t1", "Cement", 3);
        let id = cement.id.clone();
        store.add_inventory_item(cement).await;

        assert_eq!(store.reserve_stock("t1", &id, 2).await.unwrap(), Some(1));
        assert_eq!(store.reserve_stock("t1", &id, 2).await.unwrap(), None);
        assert_eq!(store.stock_of("t1", &id).await, Some(1));

        store.release_stock("t1", &id, 2).await.unwrap();
        assert_eq!(store.stock_of("t1", &id).await, Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_reserve_single_winner() {
        let store = MemoryStore::new();
        let last = item("t1", "Lifestraw Family", 1);
        let id = last.id.clone();
        store.add_inventory_item(last).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { store.reserve_stock("t1", &id, 1).await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.stock_of("t1", &id).await, Some(0));
    }

    #[tokio::test]
    async fn test_search_is_tenant_scoped() {
        let store = MemoryStore::new();
        store.add_inventory_item(item("t1", "Cement 50kg", 10)).await;
        store.add_inventory_item(item("t2", "Cement 25kg", 10)).await;

        let found = store.search_inventory("t1", "%cement%", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tenant_id, "t1");
    }

    #[tokio::test]
    async fn test_counter_starts_at_one_per_tenant() {
        let store = MemoryStore::new();
        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Sale, 2026).await.unwrap(), 1);
        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Sale, 2026).await.unwrap(), 2);
        assert_eq!(store.next_sequence_value("t2", DocumentSeries::Sale, 2026).await.unwrap(), 1);
        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Receipt, 2026).await.unwrap(), 1);
        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Sale, 2027).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counter_continues_after_existing_numbers() {
        let store = MemoryStore::new();
        for n in 1..=5 {
            store.insert_sale(&sale("t1", &format!("SALE-2026-{n:04}"))).await.unwrap();
        }
        store.insert_sale(&sale("t1", "SALE-2025-0040")).await.unwrap();
        store.insert_sale(&sale("t2", "SALE-2026-0090")).await.unwrap();

        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Sale, 2026).await.unwrap(), 6);
        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Sale, 2026).await.unwrap(), 7);

        store.insert_sale(&sale("t1", "SALE-2026-0012")).await.unwrap();
        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Sale, 2026).await.unwrap(), 13);
        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Receipt, 2026).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let store = MemoryStore::new();
        store.fail(FailPoint::NextSequence, FailureKind::Timeout, 1).await;

        let err = store.next_sequence_value("t1", DocumentSeries::Sale, 2026).await.unwrap_err();
        assert_eq!(err.code(), "TIMEOUT");
        assert_eq!(store.next_sequence_value("t1", DocumentSeries::Sale, 2026).await.unwrap(), 1);
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn test_one_open_shift_per_employee() {
        let store = MemoryStore::new();
        let shift = AttendanceRecord {
            id: new_id(),
            tenant_id: "t1".into(),
            employee_id: "e1".into(),
            employee_name: "Amina".into(),
            clock_in: Utc::now(),
            clock_out: None,
            hours_worked: None,
        };
        store.insert_attendance(&shift).await.unwrap();

        let again = AttendanceRecord { id: new_id(), ..shift.clone() };
        let err = store.insert_attendance(&again).await.unwrap_err();
        assert!(err.is_unique_violation());

        store.close_attendance("t1", &shift.id, Utc::now(), 1.0).await.unwrap();
        assert!(store.open_attendance("t1", "e1").await.unwrap().is_none());
        store.insert_attendance(&again).await.unwrap();
    }
}
