//! `record_sale`: the only multi-row write path.
//!
//! ```text
//! validate ──► search (limit 1) ──► reserve_stock ──► sale header (3 attempts)
//!                  │ no match          │ none              │ exhausted
//!                  ▼                   ▼                   ▼
//!             service sale     InsufficientStock      release stock
//!
//! ──► sale item (warn) ──► receipt (3 attempts) ──► transaction (warn) ──► reply
//!                                │ exhausted
//!                                ▼
//!                           release stock
//! ```
//!
//! Stock is taken by the conditional decrement up front, so two sales
//! racing for the last unit cannot both succeed. Every later failure that
//! aborts the sale gives the reserved units back.

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use tally_core::entities::SaleRequest;
use tally_core::product_query::{normalize_product_query, SALE_SEARCH_LIMIT};
use tally_core::{
    new_id, AuthorizedContext, CoreError, DocumentSeries, Entities, InventoryItem, PaymentReceipt,
    Sale, SaleItem, SalesTransaction, ValidationError,
};
use tally_db::StoreError;

use super::{HandlerError, HandlerResult, Reply};
use crate::formatter::SaleLine;
use crate::sequence::MAX_SEQUENCE_ATTEMPTS;
use crate::AppState;

/// Units taken from an inventory item for this sale.
struct Reservation<'a> {
    item: &'a InventoryItem,
    quantity: i64,
    remaining: i64,
}

pub async fn record_sale(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let request = SaleRequest::from_entities(entities)?;
    let query = normalize_product_query(&request.product).ok_or_else(|| ValidationError::Required {
        field: "product".to_string(),
    })?;

    if !request.payment_recognized {
        debug!(
            payment = ?entities.first_text(&["payment_method", "payment"]),
            "Unrecognized payment method, recording as Cash"
        );
    }

    let store = state.store.as_ref();
    let matched = store
        .search_inventory(&ctx.tenant_id, &query.pattern, SALE_SEARCH_LIMIT)
        .await
        .map_err(|e| HandlerError::store(format!("Could not look up '{}'", request.product), e))?
        .into_iter()
        .next();

    let reservation = match &matched {
        Some(item) => Some(reserve(state, ctx, item, request.quantity).await?),
        None => {
            debug!(product = %request.product, pattern = %query.pattern, "No inventory match, recording service sale");
            None
        }
    };

    let now = Utc::now();
    let unit_price = request.unit_price();
    let description = matched
        .as_ref()
        .map(|i| i.name.clone())
        .unwrap_or_else(|| request.product.clone());

    let header = Sale {
        id: new_id(),
        tenant_id: ctx.tenant_id.clone(),
        sale_number: String::new(),
        customer_name: request.customer_name.clone(),
        customer_phone: request.customer_phone.clone(),
        payment_method: request.payment_method,
        subtotal_cents: request.amount.cents(),
        total_cents: request.amount.cents(),
        notes: request.notes.clone(),
        created_by: ctx.user_id.clone(),
        created_at: now,
    };

    let sale = match insert_sale(state, header).await {
        Ok(sale) => sale,
        Err(e) => {
            release(state, ctx, reservation.as_ref()).await;
            return Err(HandlerError::store(
                format!(
                    "Could not record the sale of {} x {} for {}",
                    request.quantity,
                    description,
                    state.formatter.money(request.amount)
                ),
                e,
            ));
        }
    };

    let item = SaleItem {
        id: new_id(),
        tenant_id: ctx.tenant_id.clone(),
        sale_id: sale.id.clone(),
        inventory_item_id: matched.as_ref().map(|i| i.id.clone()),
        description: description.clone(),
        quantity: request.quantity,
        unit_price_cents: unit_price.cents(),
        total_price_cents: request.amount.cents(),
    };
    if let Err(e) = store.insert_sale_item(&item).await {
        warn!(sale_number = %sale.sale_number, error = %e, "Failed to insert sale item");
    }

    let receipt = PaymentReceipt {
        id: new_id(),
        tenant_id: ctx.tenant_id.clone(),
        receipt_number: String::new(),
        sale_id: Some(sale.id.clone()),
        amount_paid_cents: request.amount.cents(),
        payment_method: request.payment_method,
        client_name: request.customer_name.clone(),
        notes: format!("Payment for sale {}", sale.sale_number),
        created_at: now,
    };

    let receipt = match insert_receipt(state, receipt).await {
        Ok(receipt) => receipt,
        Err(e) => {
            release(state, ctx, reservation.as_ref()).await;
            return Err(HandlerError::store(
                format!(
                    "Sale {} was created but its receipt could not be issued. Please try again",
                    sale.sale_number
                ),
                e,
            ));
        }
    };

    let transaction = SalesTransaction {
        id: new_id(),
        tenant_id: ctx.tenant_id.clone(),
        sale_id: sale.id.clone(),
        sale_number: sale.sale_number.clone(),
        receipt_number: receipt.receipt_number.clone(),
        product_name: description.clone(),
        inventory_item_id: matched.as_ref().map(|i| i.id.clone()),
        quantity: request.quantity,
        unit_price_cents: unit_price.cents(),
        total_cents: request.amount.cents(),
        payment_method: request.payment_method,
        customer_name: request.customer_name.clone(),
        liters_sold: matched
            .as_ref()
            .and_then(|i| i.liters_per_unit)
            .map(|liters| liters * request.quantity as f64),
        recorded_by: ctx.user_id.clone(),
        transaction_date: now,
    };
    if let Err(e) = store.insert_sales_transaction(&transaction).await {
        warn!(sale_number = %sale.sale_number, error = %e, "Failed to insert sales transaction");
    }

    let remaining_stock = reservation.as_ref().map(|r| r.remaining);
    info!(
        tenant_id = %ctx.tenant_id,
        sale_number = %sale.sale_number,
        receipt_number = %receipt.receipt_number,
        total_cents = sale.total_cents,
        "Sale recorded"
    );

    let line = SaleLine {
        description,
        quantity: request.quantity,
        unit_price,
        matched: matched.is_some(),
        remaining_stock,
    };
    let message = state.formatter.sale_recorded(&sale, &receipt.receipt_number, &line);

    Ok(Reply::with_data(
        message,
        json!({
            "sale_id": sale.id,
            "sale_number": sale.sale_number,
            "receipt_id": receipt.id,
            "receipt_number": receipt.receipt_number,
            "inventory_item_id": matched.as_ref().map(|i| i.id.clone()),
            "product": line.description,
            "quantity": request.quantity,
            "total_cents": sale.total_cents,
            "payment_method": sale.payment_method,
            "remaining_stock": remaining_stock,
        }),
    ))
}

async fn reserve<'a>(
    state: &AppState,
    ctx: &AuthorizedContext,
    item: &'a InventoryItem,
    quantity: i64,
) -> Result<Reservation<'a>, HandlerError> {
    let store = state.store.as_ref();
    let context = || format!("Could not update stock for {}", item.name);

    match store
        .reserve_stock(&ctx.tenant_id, &item.id, quantity)
        .await
        .map_err(|e| HandlerError::store(context(), e))?
    {
        Some(remaining) => Ok(Reservation {
            item,
            quantity,
            remaining,
        }),
        None => {
            let available = store
                .get_inventory_item(&ctx.tenant_id, &item.id)
                .await
                .map_err(|e| HandlerError::store(context(), e))?
                .map(|i| i.current_stock)
                .unwrap_or(0);
            Err(CoreError::InsufficientStock {
                product: item.name.clone(),
                available,
                requested: quantity,
            }
            .into())
        }
    }
}

/// Gives reserved units back after an aborted sale.
async fn release(state: &AppState, ctx: &AuthorizedContext, reservation: Option<&Reservation<'_>>) {
    let Some(r) = reservation else {
        return;
    };
    match state
        .store
        .release_stock(&ctx.tenant_id, &r.item.id, r.quantity)
        .await
    {
        Ok(()) => debug!(product = %r.item.name, quantity = r.quantity, "Released reserved stock"),
        Err(e) => warn!(
            tenant_id = %ctx.tenant_id,
            product = %r.item.name,
            quantity = r.quantity,
            error = %e,
            "Failed to release reserved stock"
        ),
    }
}

async fn insert_sale(state: &AppState, mut sale: Sale) -> Result<Sale, StoreError> {
    let store = state.store.as_ref();
    let mut attempt = 0;
    loop {
        sale.sale_number = state
            .sequences
            .generate(store, &sale.tenant_id, DocumentSeries::Sale, attempt)
            .await?;
        match store.insert_sale(&sale).await {
            Ok(()) => return Ok(sale),
            Err(e) if e.is_unique_violation() && attempt + 1 < MAX_SEQUENCE_ATTEMPTS => {
                warn!(sale_number = %sale.sale_number, attempt, "Sale number taken, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn insert_receipt(state: &AppState, mut receipt: PaymentReceipt) -> Result<PaymentReceipt, StoreError> {
    let store = state.store.as_ref();
    let mut attempt = 0;
    loop {
        receipt.receipt_number = state
            .sequences
            .generate(store, &receipt.tenant_id, DocumentSeries::Receipt, attempt)
            .await?;
        match store.insert_receipt(&receipt).await {
            Ok(()) => return Ok(receipt),
            Err(e) if e.is_unique_violation() && attempt + 1 < MAX_SEQUENCE_ATTEMPTS => {
                warn!(receipt_number = %receipt.receipt_number, attempt, "Receipt number taken, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
