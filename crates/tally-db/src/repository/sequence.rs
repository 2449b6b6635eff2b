//! Document-number sources: counter rows and recent issued numbers.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use tally_core::DocumentSeries;

use crate::error::{StoreError, StoreResult};
use crate::store::SequenceStore;
use crate::PgStore;

#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: PgPool,
}

impl SequenceRepository {
    pub fn new(pool: PgPool) -> Self {
        SequenceRepository { pool }
    }

    /// Upsert-increment; the row lock serializes concurrent callers.
    ///
    /// The candidate value is one past the highest number already stored
    /// for the series, so the counter never hands out a number below an
    /// existing one.
    pub async fn next_value(&self, tenant_id: &str, series: DocumentSeries, year: i32) -> StoreResult<u32> {
        let series_key = series.key(year);
        let sql = match series {
            DocumentSeries::Sale => {
                r#"
                INSERT INTO sequence_counters (tenant_id, series, value)
                SELECT $1, $2, COALESCE(MAX(CAST(SUBSTRING(sale_number FROM '[0-9]+$') AS BIGINT)), 0) + 1
                FROM sales
                WHERE tenant_id = $1 AND sale_number LIKE $3
                ON CONFLICT (tenant_id, series)
                DO UPDATE SET value = GREATEST(sequence_counters.value + 1, EXCLUDED.value)
                RETURNING value
                "#
            }
            DocumentSeries::Receipt => {
                r#"
                INSERT INTO sequence_counters (tenant_id, series, value)
                SELECT $1, $2, COALESCE(MAX(CAST(SUBSTRING(receipt_number FROM '[0-9]+$') AS BIGINT)), 0) + 1
                FROM payment_receipts
                WHERE tenant_id = $1 AND receipt_number LIKE $3
                ON CONFLICT (tenant_id, series)
                DO UPDATE SET value = GREATEST(sequence_counters.value + 1, EXCLUDED.value)
                RETURNING value
                "#
            }
        };

        let value: i64 = sqlx::query_scalar(sql)
            .bind(tenant_id)
            .bind(&series_key)
            .bind(format!("{series_key}-%"))
            .fetch_one(&self.pool)
            .await?;

        debug!(tenant_id = %tenant_id, series = %series_key, value, "Allocated counter value");
        u32::try_from(value).map_err(|_| StoreError::Internal(format!("counter {series_key} overflowed")))
    }

    pub async fn recent_numbers(
        &self,
        tenant_id: &str,
        series: DocumentSeries,
        number_prefix: &str,
        limit: i64,
    ) -> StoreResult<Vec<String>> {
        let sql = match series {
            DocumentSeries::Sale => {
                r#"
                SELECT sale_number FROM sales
                WHERE tenant_id = $1 AND sale_number LIKE $2
                ORDER BY created_at DESC, sale_number DESC
                LIMIT $3
                "#
            }
            DocumentSeries::Receipt => {
                r#"
                SELECT receipt_number FROM payment_receipts
                WHERE tenant_id = $1 AND receipt_number LIKE $2
                ORDER BY created_at DESC, receipt_number DESC
                LIMIT $3
                "#
            }
        };

        let numbers: Vec<String> = sqlx::query_scalar(sql)
            .bind(tenant_id)
            .bind(format!("{number_prefix}%"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(numbers)
    }
}

#[async_trait]
impl SequenceStore for PgStore {
    async fn next_sequence_value(&self, tenant_id: &str, series: DocumentSeries, year: i32) -> StoreResult<u32> {
        self.sequences().next_value(tenant_id, series, year).await
    }

    async fn recent_document_numbers(
        &self,
        tenant_id: &str,
        series: DocumentSeries,
        number_prefix: &str,
        limit: i64,
    ) -> StoreResult<Vec<String>> {
        self.sequences().recent_numbers(tenant_id, series, number_prefix, limit).await
    }
}
