//! # Sequence Number Generator
//!
//! Allocates `PREFIX-YYYY-NNNN` document numbers per tenant and year.
//!
//! ```text
//! generate(tenant, Sale, attempt)
//!     │
//!     ├── attempt > 0 ──► sleep 50..=150ms (de-synchronize retriers)
//!     │
//!     ├── Counter  ──► next_sequence_value(tenant, Sale, 2026)    → 7
//!     │
//!     └── MaxScan  ──► recent_document_numbers(tenant, "SALE-2026-", 10)
//!                      max suffix + 1 + attempt                   → 7
//!     │
//!     ▼
//! "SALE-2026-0007"
//! ```
//!
//! The caller inserts the row and, on a unique violation, calls again with
//! `attempt + 1`, up to [`MAX_SEQUENCE_ATTEMPTS`] attempts in total.

use chrono::{Datelike, FixedOffset, Utc};
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::debug;

use tally_core::sequence::next_from_recent;
use tally_core::{DocumentSeries, SequenceNumber};
use tally_db::{Store, StoreResult};

use crate::config::SequenceStrategy;

/// Attempts per document insert before giving up.
pub const MAX_SEQUENCE_ATTEMPTS: u32 = 3;

/// How many recent numbers the max-scan strategy reads.
const RECENT_SCAN_LIMIT: i64 = 10;

const RETRY_JITTER_MS: RangeInclusive<u64> = 50..=150;

#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    strategy: SequenceStrategy,
    offset: FixedOffset,
    jitter_ms: RangeInclusive<u64>,
}

impl SequenceGenerator {
    pub fn new(strategy: SequenceStrategy, offset: FixedOffset) -> Self {
        SequenceGenerator {
            strategy,
            offset,
            jitter_ms: RETRY_JITTER_MS,
        }
    }

    /// Disables the retry sleep.
    pub fn without_jitter(mut self) -> Self {
        self.jitter_ms = 0..=0;
        self
    }

    pub fn strategy(&self) -> SequenceStrategy {
        self.strategy
    }

    pub async fn generate(
        &self,
        store: &dyn Store,
        tenant_id: &str,
        series: DocumentSeries,
        attempt: u32,
    ) -> StoreResult<String> {
        if attempt > 0 && *self.jitter_ms.end() > 0 {
            let delay = rand::thread_rng().gen_range(self.jitter_ms.clone());
            debug!(attempt, delay_ms = delay, "Backing off before sequence retry");
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let year = Utc::now().with_timezone(&self.offset).year();

        let value = match self.strategy {
            SequenceStrategy::Counter => store.next_sequence_value(tenant_id, series, year).await?,
            SequenceStrategy::MaxScan => {
                let prefix = format!("{}-", series.key(year));
                let recent = store
                    .recent_document_numbers(tenant_id, series, &prefix, RECENT_SCAN_LIMIT)
                    .await?;
                next_from_recent(&recent, series, year, attempt)
            }
        };

        let number = SequenceNumber::new(series, year, value).to_string();
        debug!(tenant_id = %tenant_id, number = %number, attempt, "Allocated document number");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;
    use tally_core::{new_id, PaymentMethod, Sale};
    use tally_db::{MemoryStore, SalesStore};

    fn generator(strategy: SequenceStrategy) -> SequenceGenerator {
        SequenceGenerator::new(strategy, Utc.fix()).without_jitter()
    }

    fn sale(tenant: &str, number: &str) -> Sale {
        Sale {
            id: new_id(),
            tenant_id: tenant.into(),
            sale_number: number.into(),
            customer_name: "Walk-in Customer".into(),
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            subtotal_cents: 100,
            total_cents: 100,
            notes: None,
            created_by: "u1".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_counter_is_gap_free() {
        let store = MemoryStore::new();
        let sequences = generator(SequenceStrategy::Counter);
        let year = Utc::now().year();

        let mut previous = 0;
        for expected in 1..=5u32 {
            let number = sequences.generate(&store, "t1", DocumentSeries::Sale, 0).await.unwrap();
            assert_eq!(number, format!("SALE-{year}-{expected:04}"));
            let parsed = SequenceNumber::parse(&number).unwrap();
            assert_eq!(parsed.value, previous + 1);
            previous = parsed.value;
        }
    }

    #[tokio::test]
    async fn test_counter_picks_up_from_issued_numbers() {
        let store = MemoryStore::new();
        let sequences = generator(SequenceStrategy::Counter);
        let year = Utc::now().year();

        for n in [1, 2, 9] {
            store.insert_sale(&sale("t1", &format!("SALE-{year}-{n:04}"))).await.unwrap();
        }

        let next = sequences.generate(&store, "t1", DocumentSeries::Sale, 0).await.unwrap();
        assert_eq!(next, format!("SALE-{year}-0010"));
        let after = sequences.generate(&store, "t1", DocumentSeries::Sale, 0).await.unwrap();
        assert_eq!(after, format!("SALE-{year}-0011"));
    }

    #[tokio::test]
    async fn test_series_and_tenants_are_independent() {
        let store = MemoryStore::new();
        let sequences = generator(SequenceStrategy::Counter);

        sequences.generate(&store, "t1", DocumentSeries::Sale, 0).await.unwrap();
        let receipt = sequences.generate(&store, "t1", DocumentSeries::Receipt, 0).await.unwrap();
        let other = sequences.generate(&store, "t2", DocumentSeries::Sale, 0).await.unwrap();

        assert!(receipt.starts_with("RCP-") && receipt.ends_with("-0001"));
        assert!(other.ends_with("-0001"));
    }

    #[tokio::test]
    async fn test_max_scan_follows_inserted_rows() {
        let store = MemoryStore::new();
        let sequences = generator(SequenceStrategy::MaxScan);
        let year = Utc::now().year();

        for _ in 0..3 {
            let number = sequences.generate(&store, "t1", DocumentSeries::Sale, 0).await.unwrap();
            store.insert_sale(&sale("t1", &number)).await.unwrap();
        }
        let next = sequences.generate(&store, "t1", DocumentSeries::Sale, 0).await.unwrap();
        assert_eq!(next, format!("SALE-{year}-0004"));

        // a retry skips past the colliding value
        let skipped = sequences.generate(&store, "t1", DocumentSeries::Sale, 1).await.unwrap();
        assert_eq!(skipped, format!("SALE-{year}-0005"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_sleeps_within_jitter_window() {
        let store = MemoryStore::new();
        let sequences = SequenceGenerator::new(SequenceStrategy::Counter, Utc.fix());

        let started = tokio::time::Instant::now();
        sequences.generate(&store, "t1", DocumentSeries::Sale, 0).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(50));

        let started = tokio::time::Instant::now();
        sequences.generate(&store, "t1", DocumentSeries::Sale, 1).await.unwrap();
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(50) && waited <= Duration::from_millis(151));
    }
}
