//! # Inventory Repository
//!
//! Product search and stock movement.
//!
//! ## Atomic Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two cashiers sell the last bag at the same moment                      │
//! │                                                                         │
//! │  A: UPDATE ... SET current_stock = current_stock - 1                    │
//! │        WHERE id = $item AND current_stock >= 1   → 1 row, returns 0     │
//! │  B: UPDATE ... (same)                            → 0 rows → None        │
//! │                                                                         │
//! │  The row lock taken by A's UPDATE makes B re-evaluate the predicate,   │
//! │  so exactly one of them wins and stock never goes below zero.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use tally_core::InventoryItem;

use crate::error::StoreResult;
use crate::store::InventoryStore;
use crate::PgStore;

#[derive(Debug, Clone, sqlx::FromRow)]
struct InventoryRecord {
    id: String,
    tenant_id: String,
    name: String,
    sku: Option<String>,
    current_stock: i64,
    reorder_level: i64,
    unit_price_cents: i64,
    liters_per_unit: Option<f64>,
}

impl From<InventoryRecord> for InventoryItem {
    fn from(r: InventoryRecord) -> Self {
        InventoryItem {
            id: r.id,
            tenant_id: r.tenant_id,
            name: r.name,
            sku: r.sku,
            current_stock: r.current_stock,
            reorder_level: r.reorder_level,
            unit_price_cents: r.unit_price_cents,
            liters_per_unit: r.liters_per_unit,
        }
    }
}

const COLUMNS: &str =
    "id, tenant_id, name, sku, current_stock, reorder_level, unit_price_cents, liters_per_unit";

/// Repository for inventory operations.
///
/// ## Usage
/// ```rust,ignore
/// let items = store.inventory().search(tenant, "%cement%", 10).await?;
/// let remaining = store.inventory().reserve(tenant, &items[0].id, 2).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        InventoryRepository { pool }
    }

    /// Case-insensitive `LIKE` over name and SKU.
    ///
    /// `pattern` comes from the product query normalizer and is already
    /// escaped; `ESCAPE '\'` makes `\%` and `\_` literal.
    pub async fn search(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        debug!(tenant_id = %tenant_id, pattern = %pattern, limit, "Searching inventory");

        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM inventory_items
            WHERE tenant_id = $1
              AND (name ILIKE $2 ESCAPE '\' OR COALESCE(sku, '') ILIKE $2 ESCAPE '\')
            ORDER BY name
            LIMIT $3
            "#
        );
        let records = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(tenant_id)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), "Search returned items");
        Ok(records.into_iter().map(InventoryItem::from).collect())
    }

    pub async fn list(&self, tenant_id: &str, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        let sql = format!("SELECT {COLUMNS} FROM inventory_items WHERE tenant_id = $1 ORDER BY name LIMIT $2");
        let records = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(tenant_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(InventoryItem::from).collect())
    }

    pub async fn low_stock(&self, tenant_id: &str) -> StoreResult<Vec<InventoryItem>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM inventory_items \
             WHERE tenant_id = $1 AND current_stock <= reorder_level \
             ORDER BY current_stock, name"
        );
        let records = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(InventoryItem::from).collect())
    }

    pub async fn get_by_id(&self, tenant_id: &str, item_id: &str) -> StoreResult<Option<InventoryItem>> {
        let sql = format!("SELECT {COLUMNS} FROM inventory_items WHERE tenant_id = $1 AND id = $2");
        let record = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(tenant_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(InventoryItem::from))
    }

    /// Conditional decrement. `None` when stock is short.
    pub async fn reserve(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<Option<i64>> {
        debug!(tenant_id = %tenant_id, item_id = %item_id, quantity, "Reserving stock");

        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE inventory_items
            SET current_stock = current_stock - $3
            WHERE tenant_id = $1 AND id = $2 AND current_stock >= $3
            RETURNING current_stock
            "#,
        )
        .bind(tenant_id)
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(remaining)
    }

    pub async fn release(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<()> {
        debug!(tenant_id = %tenant_id, item_id = %item_id, quantity, "Releasing stock");

        sqlx::query(
            r#"
            UPDATE inventory_items
            SET current_stock = current_stock + $3
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(item_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn search_inventory(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        self.inventory().search(tenant_id, pattern, limit).await
    }

    async fn list_inventory(&self, tenant_id: &str, limit: i64) -> StoreResult<Vec<InventoryItem>> {
        self.inventory().list(tenant_id, limit).await
    }

    async fn low_stock_items(&self, tenant_id: &str) -> StoreResult<Vec<InventoryItem>> {
        self.inventory().low_stock(tenant_id).await
    }

    async fn get_inventory_item(&self, tenant_id: &str, item_id: &str) -> StoreResult<Option<InventoryItem>> {
        self.inventory().get_by_id(tenant_id, item_id).await
    }

    async fn reserve_stock(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<Option<i64>> {
        self.inventory().reserve(tenant_id, item_id, quantity).await
    }

    async fn release_stock(&self, tenant_id: &str, item_id: &str, quantity: i64) -> StoreResult<()> {
        self.inventory().release(tenant_id, item_id, quantity).await
    }
}
