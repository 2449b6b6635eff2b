//! Expense writes and period reads.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::debug;

use tally_core::{Expense, ExpenseCategory};

use crate::error::StoreResult;
use crate::store::ExpenseStore;
use crate::PgStore;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ExpenseRecord {
    id: String,
    tenant_id: String,
    category: String,
    amount_cents: i64,
    vendor_name: Option<String>,
    description: String,
    date_incurred: NaiveDate,
    recorded_by: String,
    created_at: DateTime<Utc>,
}

impl From<ExpenseRecord> for Expense {
    fn from(r: ExpenseRecord) -> Self {
        Expense {
            id: r.id,
            tenant_id: r.tenant_id,
            category: ExpenseCategory::parse(&r.category).unwrap_or(ExpenseCategory::Other),
            amount_cents: r.amount_cents,
            vendor_name: r.vendor_name,
            description: r.description,
            date_incurred: r.date_incurred,
            recorded_by: r.recorded_by,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn insert(&self, expense: &Expense) -> StoreResult<()> {
        debug!(id = %expense.id, category = %expense.category, amount = expense.amount_cents, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, tenant_id, category, amount_cents, vendor_name,
                description, date_incurred, recorded_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.tenant_id)
        .bind(expense.category.as_str())
        .bind(expense.amount_cents)
        .bind(&expense.vendor_name)
        .bind(&expense.description)
        .bind(expense.date_incurred)
        .bind(&expense.recorded_by)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn between(&self, tenant_id: &str, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Expense>> {
        let records = sqlx::query_as::<_, ExpenseRecord>(
            r#"
            SELECT id, tenant_id, category, amount_cents, vendor_name,
                   description, date_incurred, recorded_by, created_at
            FROM expenses
            WHERE tenant_id = $1 AND date_incurred >= $2 AND date_incurred < $3
            ORDER BY date_incurred, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(Expense::from).collect())
    }
}

#[async_trait]
impl ExpenseStore for PgStore {
    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()> {
        self.expenses().insert(expense).await
    }

    async fn expenses_between(&self, tenant_id: &str, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Expense>> {
        self.expenses().between(tenant_id, from, to).await
    }
}
