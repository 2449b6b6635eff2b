//! # Per-Call Deadlines
//!
//! [`TimedStore`] wraps any [`Store`] and bounds every call with
//! `tokio::time::timeout`. An expired call surfaces as
//! [`StoreError::Timeout`] naming the operation, so a stalled database turns
//! into a structured failure instead of a hung request.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use tally_core::{
    AttendanceRecord, DocumentSeries, Employee, Expense, InventoryItem, Membership,
    PaymentReceipt, Sale, SaleItem, SalesTransaction, Task,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    ExpenseStore, InventoryStore, MembershipStore, SalesStore, SequenceStore, StaffStore, Store,
    TaskStore,
};

/// Default deadline applied to each store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct TimedStore<S> {
    inner: S,
    deadline: Duration,
}

impl<S: Store> TimedStore<S> {
    pub fn new(inner: S, deadline: Duration) -> Self {
        TimedStore { inner, deadline }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn run<T, F>(&self, operation: &'static str, call: F) -> StoreResult<T>
    where
        T: Send,
        F: Future<Output = StoreResult<T>> + Send,
    {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, deadline_ms = self.deadline.as_millis() as u64, "Store call timed out");
                Err(StoreError::Timeout {
                    operation,
                    after: self.deadline,
                })
            }
        }
    }
}

#[async_trait]
impl<S: Store> MembershipStore for TimedStore<S> {
    async fn find_membership(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Membership>> {
        self.run("find_membership", self.inner.find_membership(tenant_id, user_id)).await
    }
}

#[async_trait]
impl<S: Store> InventoryStore for TimedStore<S> {
    async fn search_inventory(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        self.run("search_inventory", self.inner.search_inventory(tenant_id, pattern, limit)).await
    }

    async fn list_inventory(&self, tenant_id: &str, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        self.run("list_inventory", self.inner.list_inventory(tenant_id, limit)).await
    }

    async fn low_stock_items(&self, tenant_id: &str) -> StoreResult<Vec<InventoryItem>> {
        self.run("low_stock_items", self.inner.low_stock_items(tenant_id)).await
    }

    async fn get_inventory_item(&self, tenant_id: &str, item_id: &str) -> StoreResult<Option<InventoryItem>> {
        self.run("get_inventory_item", self.inner.get_inventory_item(tenant_id, item_id)).await
    }

    async fn reserve_stock(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<Option<i64>> {
        self.run("reserve_stock", self.inner.reserve_stock(tenant_id, item_id, quantity)).await
    }

    async fn release_stock(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<()> {
        self.run("release_stock", self.inner.release_stock(tenant_id, item_id, quantity)).await
    }
}

#[async_trait]
impl<S: Store> SequenceStore for TimedStore<S> {
    async fn next_sequence_value(&self, tenant_id: &str, series: DocumentSeries, year: i32) -> StoreResult<u32> {
        self.run("next_sequence_value", self.inner.next_sequence_value(tenant_id, series, year)).await
    }

    async fn recent_document_numbers(
        &self,
        tenant_id: &str,
        series: DocumentSeries,
        number_prefix: &str,
        limit: i64,
    ) -> StoreResult<Vec<String>> {
        self.run(
            "recent_document_numbers",
            self.inner.recent_document_numbers(tenant_id, series, number_prefix, limit),
        )
        .await
    }
}

#[async_trait]
impl<S: Store> SalesStore for TimedStore<S> {
    async fn insert_sale(&self, sale: &Sale) -> StoreResult<()> {
        self.run("insert_sale", self.inner.insert_sale(sale)).await
    }

    async fn insert_sale_item(&self, item: &SaleItem) -> StoreResult<()> {
        self.run("insert_sale_item", self.inner.insert_sale_item(item)).await
    }

    async fn insert_receipt(&self, receipt: &PaymentReceipt) -> StoreResult<()> {
        self.run("insert_receipt", self.inner.insert_receipt(receipt)).await
    }

    async fn insert_sales_transaction(&self, transaction: &SalesTransaction) -> StoreResult<()> {
        self.run("insert_sales_transaction", self.inner.insert_sales_transaction(transaction)).await
    }

    async fn sales_between(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Sale>> {
        self.run("sales_between", self.inner.sales_between(tenant_id, from, to)).await
    }

    async fn transactions_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesTransaction>> {
        self.run("transactions_between", self.inner.transactions_between(tenant_id, from, to)).await
    }

    async fn find_sale_by_number(&self, tenant_id: &str, sale_number: &str) -> StoreResult<Option<Sale>> {
        self.run("find_sale_by_number", self.inner.find_sale_by_number(tenant_id, sale_number)).await
    }

    async fn latest_sale(&self, tenant_id: &str) -> StoreResult<Option<Sale>> {
        self.run("latest_sale", self.inner.latest_sale(tenant_id)).await
    }

    async fn sale_items(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Vec<SaleItem>> {
        self.run("sale_items", self.inner.sale_items(tenant_id, sale_id)).await
    }

    async fn receipt_for_sale(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Option<PaymentReceipt>> {
        self.run("receipt_for_sale", self.inner.receipt_for_sale(tenant_id, sale_id)).await
    }

    async fn sales_for_customer(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<Sale>> {
        self.run("sales_for_customer", self.inner.sales_for_customer(tenant_id, pattern, limit)).await
    }
}

#[async_trait]
impl<S: Store> ExpenseStore for TimedStore<S> {
    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()> {
        self.run("insert_expense", self.inner.insert_expense(expense)).await
    }

    async fn expenses_between(&self, tenant_id: &str, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Expense>> {
        self.run("expenses_between", self.inner.expenses_between(tenant_id, from, to)).await
    }
}

#[async_trait]
impl<S: Store> StaffStore for TimedStore<S> {
    async fn employee_for_user(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Employee>> {
        self.run("employee_for_user", self.inner.employee_for_user(tenant_id, user_id)).await
    }

    async fn list_employees(&self, tenant_id: &str) -> StoreResult<Vec<Employee>> {
        self.run("list_employees", self.inner.list_employees(tenant_id)).await
    }

    async fn search_employees(&self, tenant_id: &str, pattern: &str) -> StoreResult<Vec<Employee>> {
        self.run("search_employees", self.inner.search_employees(tenant_id, pattern)).await
    }

    async fn open_attendance(&self, tenant_id: &str, employee_id: &str) -> StoreResult<Option<AttendanceRecord>> {
        self.run("open_attendance", self.inner.open_attendance(tenant_id, employee_id)).await
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        self.run("insert_attendance", self.inner.insert_attendance(record)).await
    }

    async fn close_attendance(
        &self,
        tenant_id: &str,
        record_id: &str,
        clock_out: DateTime<Utc>,
        hours_worked: f64,
    ) -> StoreResult<()> {
        self.run(
            "close_attendance",
            self.inner.close_attendance(tenant_id, record_id, clock_out, hours_worked),
        )
        .await
    }

    async fn attendance_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        self.run("attendance_between", self.inner.attendance_between(tenant_id, from, to)).await
    }
}

#[async_trait]
impl<S: Store> TaskStore for TimedStore<S> {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.run("insert_task", self.inner.insert_task(task)).await
    }

    async fn open_tasks(&self, tenant_id: &str, assigned_to: Option<&str>) -> StoreResult<Vec<Task>> {
        self.run("open_tasks", self.inner.open_tasks(tenant_id, assigned_to)).await
    }

    async fn search_tasks(
        &self,
        tenant_id: &str,
        pattern: &str,
        assigned_to: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<Task>> {
        self.run("search_tasks", self.inner.search_tasks(tenant_id, pattern, assigned_to, limit))
            .await
    }

    async fn complete_task(&self, tenant_id: &str, task_id: &str, completed_at: DateTime<Utc>) -> StoreResult<()> {
        self.run("complete_task", self.inner.complete_task(tenant_id, task_id, completed_at)).await
    }
}

#[async_trait]
impl<S: Store> Store for TimedStore<S> {
    async fn ping(&self) -> StoreResult<()> {
        self.run("ping", self.inner.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    /// Membership lookups that never complete.
    #[derive(Clone, Default)]
    struct Stalled(MemoryStore);

    #[tokio::test]
    async fn test_passes_through_within_deadline() {
        let memory = MemoryStore::new();
        memory.add_membership("t1", "u1", "admin").await;
        let store = TimedStore::new(memory, Duration::from_millis(200));

        let found = store.find_membership("t1", "u1").await.unwrap();
        assert_eq!(found.map(|m| m.role), Some("admin".to_string()));
    }

    #[tokio::test]
    async fn test_expired_call_reports_operation() {
        let store = TimedStore::new(Stalled::default(), Duration::from_millis(20));
        let err = store.find_membership("t1", "u1").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Timeout {
                operation: "find_membership",
                after: Duration::from_millis(20),
            }
        );
    }

    #[async_trait]
    impl MembershipStore for Stalled {
        async fn find_membership(&self, _tenant_id: &str, _user_id: &str) -> StoreResult<Option<Membership>> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl InventoryStore for Stalled {
        async fn search_inventory(&self, t: &str, p: &str, l: i64) -> StoreResult<Vec<InventoryItem>> {
            self.0.search_inventory(t, p, l).await
        }
        async fn list_inventory(&self, t: &str, l: i64) -> StoreResult<Vec<InventoryItem>> {
            self.0.list_inventory(t, l).await
        }
        async fn low_stock_items(&self, t: &str) -> StoreResult<Vec<InventoryItem>> {
            self.0.low_stock_items(t).await
        }
        async fn get_inventory_item(&self, t: &str, id: &str) -> StoreResult<Option<InventoryItem>> {
            self.0.get_inventory_item(t, id).await
        }
        async fn reserve_stock(&self, t: &str, id: &str, q: i64) -> StoreResult<Option<i64>> {
            self.0.reserve_stock(t, id, q).await
        }
        async fn release_stock(&self, t: &str, id: &str, q: i64) -> StoreResult<()> {
            self.0.release_stock(t, id, q).await
        }
    }

    #[async_trait]
    impl SequenceStore for Stalled {
        async fn next_sequence_value(&self, t: &str, s: DocumentSeries, y: i32) -> StoreResult<u32> {
            self.0.next_sequence_value(t, s, y).await
        }
        async fn recent_document_numbers(
            &self,
            t: &str,
            s: DocumentSeries,
            p: &str,
            l: i64,
        ) -> StoreResult<Vec<String>> {
            self.0.recent_document_numbers(t, s, p, l).await
        }
    }

    #[async_trait]
    impl SalesStore for Stalled {
        async fn insert_sale(&self, s: &Sale) -> StoreResult<()> {
            self.0.insert_sale(s).await
        }
        async fn insert_sale_item(&self, i: &SaleItem) -> StoreResult<()> {
            self.0.insert_sale_item(i).await
        }
        async fn insert_receipt(&self, r: &PaymentReceipt) -> StoreResult<()> {
            self.0.insert_receipt(r).await
        }
        async fn insert_sales_transaction(&self, x: &SalesTransaction) -> StoreResult<()> {
            self.0.insert_sales_transaction(x).await
        }
        async fn sales_between(&self, t: &str, f: DateTime<Utc>, u: DateTime<Utc>) -> StoreResult<Vec<Sale>> {
            self.0.sales_between(t, f, u).await
        }
        async fn transactions_between(
            &self,
            t: &str,
            f: DateTime<Utc>,
            u: DateTime<Utc>,
        ) -> StoreResult<Vec<SalesTransaction>> {
            self.0.transactions_between(t, f, u).await
        }
        async fn find_sale_by_number(&self, t: &str, n: &str) -> StoreResult<Option<Sale>> {
            self.0.find_sale_by_number(t, n).await
        }
        async fn latest_sale(&self, t: &str) -> StoreResult<Option<Sale>> {
            self.0.latest_sale(t).await
        }
        async fn sale_items(&self, t: &str, s: &str) -> StoreResult<Vec<SaleItem>> {
            self.0.sale_items(t, s).await
        }
        async fn receipt_for_sale(&self, t: &str, s: &str) -> StoreResult<Option<PaymentReceipt>> {
            self.0.receipt_for_sale(t, s).await
        }
        async fn sales_for_customer(&self, t: &str, p: &str, l: i64) -> StoreResult<Vec<Sale>> {
            self.0.sales_for_customer(t, p, l).await
        }
    }

    #[async_trait]
    impl ExpenseStore for Stalled {
        async fn insert_expense(&self, e: &Expense) -> StoreResult<()> {
            self.0.insert_expense(e).await
        }
        async fn expenses_between(&self, t: &str, f: NaiveDate, u: NaiveDate) -> StoreResult<Vec<Expense>> {
            self.0.expenses_between(t, f, u).await
        }
    }

    #[async_trait]
    impl StaffStore for Stalled {
        async fn employee_for_user(&self, t: &str, u: &str) -> StoreResult<Option<Employee>> {
            self.0.employee_for_user(t, u).await
        }
        async fn list_employees(&self, t: &str) -> StoreResult<Vec<Employee>> {
            self.0.list_employees(t).await
        }
        async fn search_employees(&self, t: &str, p: &str) -> StoreResult<Vec<Employee>> {
            self.0.search_employees(t, p).await
        }
        async fn open_attendance(&self, t: &str, e: &str) -> StoreResult<Option<AttendanceRecord>> {
            self.0.open_attendance(t, e).await
        }
        async fn insert_attendance(&self, r: &AttendanceRecord) -> StoreResult<()> {
            self.0.insert_attendance(r).await
        }
        async fn close_attendance(&self, t: &str, r: &str, c: DateTime<Utc>, h: f64) -> StoreResult<()> {
            self.0.close_attendance(t, r, c, h).await
        }
        async fn attendance_between(
            &self,
            t: &str,
            f: DateTime<Utc>,
            u: DateTime<Utc>,
        ) -> StoreResult<Vec<AttendanceRecord>> {
            self.0.attendance_between(t, f, u).await
        }
    }

    #[async_trait]
    impl TaskStore for Stalled {
        async fn insert_task(&self, x: &Task) -> StoreResult<()> {
            self.0.insert_task(x).await
        }
        async fn open_tasks(&self, t: &str, a: Option<&str>) -> StoreResult<Vec<Task>> {
            self.0.open_tasks(t, a).await
        }
        async fn search_tasks(&self, t: &str, p: &str, a: Option<&str>, l: i64) -> StoreResult<Vec<Task>> {
            self.0.search_tasks(t, p, a, l).await
        }
        async fn complete_task(&self, t: &str, id: &str, c: DateTime<Utc>) -> StoreResult<()> {
            self.0.complete_task(t, id, c).await
        }
    }

    #[async_trait]
    impl Store for Stalled {
        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }
}
