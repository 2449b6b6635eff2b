//! # Sale Repository
//!
//! Sale headers, line items, receipts and the analytics projection.
//!
//! ## Row Family of One Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales                 SALE-2026-0042   (unique per tenant)             │
//! │    ├── sale_items      "Cement (50kg bag)" × 5                          │
//! │    └── payment_receipts RCP-2026-0040   notes: "Sale SALE-2026-0042"    │
//! │  sales_transactions    denormalized copy for reports                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rows are written by separate calls; the recorder in intent-api owns
//! the ordering and the failure policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use tally_core::{PaymentMethod, PaymentReceipt, Sale, SaleItem, SalesTransaction};

use crate::error::StoreResult;
use crate::store::SalesStore;
use crate::PgStore;

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleRecord {
    id: String,
    tenant_id: String,
    sale_number: String,
    customer_name: String,
    customer_phone: Option<String>,
    payment_method: String,
    subtotal_cents: i64,
    total_cents: i64,
    notes: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl From<SaleRecord> for Sale {
    fn from(r: SaleRecord) -> Self {
        Sale {
            id: r.id,
            tenant_id: r.tenant_id,
            sale_number: r.sale_number,
            customer_name: r.customer_name,
            customer_phone: r.customer_phone,
            payment_method: PaymentMethod::from_label(&r.payment_method),
            subtotal_cents: r.subtotal_cents,
            total_cents: r.total_cents,
            notes: r.notes,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleItemRecord {
    id: String,
    tenant_id: String,
    sale_id: String,
    inventory_item_id: Option<String>,
    description: String,
    quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
}

impl From<SaleItemRecord> for SaleItem {
    fn from(r: SaleItemRecord) -> Self {
        SaleItem {
            id: r.id,
            tenant_id: r.tenant_id,
            sale_id: r.sale_id,
            inventory_item_id: r.inventory_item_id,
            description: r.description,
            quantity: r.quantity,
            unit_price_cents: r.unit_price_cents,
            total_price_cents: r.total_price_cents,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ReceiptRecord {
    id: String,
    tenant_id: String,
    receipt_number: String,
    sale_id: Option<String>,
    amount_paid_cents: i64,
    payment_method: String,
    client_name: String,
    notes: String,
    created_at: DateTime<Utc>,
}

impl From<ReceiptRecord> for PaymentReceipt {
    fn from(r: ReceiptRecord) -> Self {
        PaymentReceipt {
            id: r.id,
            tenant_id: r.tenant_id,
            receipt_number: r.receipt_number,
            sale_id: r.sale_id,
            amount_paid_cents: r.amount_paid_cents,
            payment_method: PaymentMethod::from_label(&r.payment_method),
            client_name: r.client_name,
            notes: r.notes,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TransactionRecord {
    id: String,
    tenant_id: String,
    sale_id: String,
    sale_number: String,
    receipt_number: String,
    product_name: String,
    inventory_item_id: Option<String>,
    quantity: i64,
    unit_price_cents: i64,
    total_cents: i64,
    payment_method: String,
    customer_name: String,
    liters_sold: Option<f64>,
    recorded_by: String,
    transaction_date: DateTime<Utc>,
}

impl From<TransactionRecord> for SalesTransaction {
    fn from(r: TransactionRecord) -> Self {
        SalesTransaction {
            id: r.id,
            tenant_id: r.tenant_id,
            sale_id: r.sale_id,
            sale_number: r.sale_number,
            receipt_number: r.receipt_number,
            product_name: r.product_name,
            inventory_item_id: r.inventory_item_id,
            quantity: r.quantity,
            unit_price_cents: r.unit_price_cents,
            total_cents: r.total_cents,
            payment_method: PaymentMethod::from_label(&r.payment_method),
            customer_name: r.customer_name,
            liters_sold: r.liters_sold,
            recorded_by: r.recorded_by,
            transaction_date: r.transaction_date,
        }
    }
}

const SALE_COLUMNS: &str = "id, tenant_id, sale_number, customer_name, customer_phone, payment_method, \
     subtotal_cents, total_cents, notes, created_by, created_at";

const RECEIPT_COLUMNS: &str =
    "id, tenant_id, receipt_number, sale_id, amount_paid_cents, payment_method, client_name, notes, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: PgPool,
}

impl SaleRepository {
    pub fn new(pool: PgPool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale header.
    ///
    /// ## Errors
    /// `UniqueViolation` on `(tenant_id, sale_number)`; the caller retries
    /// with a fresh number.
    pub async fn insert_sale(&self, sale: &Sale) -> StoreResult<()> {
        debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, sale_number, customer_name, customer_phone, payment_method,
                subtotal_cents, total_cents, notes, created_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.sale_number)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(sale.payment_method.as_str())
        .bind(sale.subtotal_cents)
        .bind(sale.total_cents)
        .bind(&sale.notes)
        .bind(&sale.created_by)
        .bind(sale.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_item(&self, item: &SaleItem) -> StoreResult<()> {
        debug!(sale_id = %item.sale_id, description = %item.description, "Adding sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, tenant_id, sale_id, inventory_item_id, description,
                quantity, unit_price_cents, total_price_cents
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.tenant_id)
        .bind(&item.sale_id)
        .bind(&item.inventory_item_id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_price_cents)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_receipt(&self, receipt: &PaymentReceipt) -> StoreResult<()> {
        debug!(receipt_number = %receipt.receipt_number, amount = receipt.amount_paid_cents, "Recording receipt");

        sqlx::query(
            r#"
            INSERT INTO payment_receipts (
                id, tenant_id, receipt_number, sale_id, amount_paid_cents,
                payment_method, client_name, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.tenant_id)
        .bind(&receipt.receipt_number)
        .bind(&receipt.sale_id)
        .bind(receipt.amount_paid_cents)
        .bind(receipt.payment_method.as_str())
        .bind(&receipt.client_name)
        .bind(&receipt.notes)
        .bind(receipt.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_transaction(&self, tx: &SalesTransaction) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales_transactions (
                id, tenant_id, sale_id, sale_number, receipt_number, product_name,
                inventory_item_id, quantity, unit_price_cents, total_cents, payment_method,
                customer_name, liters_sold, recorded_by, transaction_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.tenant_id)
        .bind(&tx.sale_id)
        .bind(&tx.sale_number)
        .bind(&tx.receipt_number)
        .bind(&tx.product_name)
        .bind(&tx.inventory_item_id)
        .bind(tx.quantity)
        .bind(tx.unit_price_cents)
        .bind(tx.total_cents)
        .bind(tx.payment_method.as_str())
        .bind(&tx.customer_name)
        .bind(tx.liters_sold)
        .bind(&tx.recorded_by)
        .bind(tx.transaction_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn between(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE tenant_id = $1 AND created_at >= $2 AND created_at < $3 \
             ORDER BY created_at"
        );
        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Sale::from).collect())
    }

    pub async fn transactions_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesTransaction>> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, tenant_id, sale_id, sale_number, receipt_number, product_name,
                   inventory_item_id, quantity, unit_price_cents, total_cents, payment_method,
                   customer_name, liters_sold, recorded_by, transaction_date
            FROM sales_transactions
            WHERE tenant_id = $1 AND transaction_date >= $2 AND transaction_date < $3
            ORDER BY transaction_date
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(SalesTransaction::from).collect())
    }

    pub async fn find_by_number(&self, tenant_id: &str, sale_number: &str) -> StoreResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = $1 AND sale_number = $2");
        let record = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(tenant_id)
            .bind(sale_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(Sale::from))
    }

    pub async fn latest(&self, tenant_id: &str) -> StoreResult<Option<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = $1 \
             ORDER BY created_at DESC, sale_number DESC LIMIT 1"
        );
        let record = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(Sale::from))
    }

    pub async fn items(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Vec<SaleItem>> {
        let records = sqlx::query_as::<_, SaleItemRecord>(
            r#"
            SELECT id, tenant_id, sale_id, inventory_item_id, description,
                   quantity, unit_price_cents, total_price_cents
            FROM sale_items
            WHERE tenant_id = $1 AND sale_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(SaleItem::from).collect())
    }

    pub async fn receipt_for(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Option<PaymentReceipt>> {
        let sql = format!(
            "SELECT {RECEIPT_COLUMNS} FROM payment_receipts \
             WHERE tenant_id = $1 AND sale_id = $2 ORDER BY created_at LIMIT 1"
        );
        let record = sqlx::query_as::<_, ReceiptRecord>(&sql)
            .bind(tenant_id)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(PaymentReceipt::from))
    }

    pub async fn for_customer(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE tenant_id = $1
              AND (customer_name ILIKE $2 ESCAPE '\' OR COALESCE(customer_phone, '') ILIKE $2 ESCAPE '\')
            ORDER BY created_at DESC
            LIMIT $3
            "#
        );
        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(tenant_id)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Sale::from).collect())
    }
}

#[async_trait]
impl SalesStore for PgStore {
    async fn insert_sale(&self, sale: &Sale) -> StoreResult<()> {
        self.sales().insert_sale(sale).await
    }

    async fn insert_sale_item(&self, item: &SaleItem) -> StoreResult<()> {
        self.sales().insert_item(item).await
    }

    async fn insert_receipt(&self, receipt: &PaymentReceipt) -> StoreResult<()> {
        self.sales().insert_receipt(receipt).await
    }

    async fn insert_sales_transaction(&self, transaction: &SalesTransaction) -> StoreResult<()> {
        self.sales().insert_transaction(transaction).await
    }

    async fn sales_between(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Sale>> {
        self.sales().between(tenant_id, from, to).await
    }

    async fn transactions_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesTransaction>> {
        self.sales().transactions_between(tenant_id, from, to).await
    }

    async fn find_sale_by_number(&self, tenant_id: &str, sale_number: &str) -> StoreResult<Option<Sale>> {
        self.sales().find_by_number(tenant_id, sale_number).await
    }

    async fn latest_sale(&self, tenant_id: &str) -> StoreResult<Option<Sale>> {
        self.sales().latest(tenant_id).await
    }

    async fn sale_items(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Vec<SaleItem>> {
        self.sales().items(tenant_id, sale_id).await
    }

    async fn receipt_for_sale(&self, tenant_id: &str, sale_id: &str) -> StoreResult<Option<PaymentReceipt>> {
        self.sales().receipt_for(tenant_id, sale_id).await
    }

    async fn sales_for_customer(&self, tenant_id: &str, pattern: &str, limit: i64) -> StoreResult<Vec<Sale>> {
        self.sales().for_customer(tenant_id, pattern, limit).await
    }
}
