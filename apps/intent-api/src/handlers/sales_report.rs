//! Sales reporting: period summaries and single-sale details.

use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;

use tally_core::sanitize::sanitize_input;
use tally_core::{AuthorizedContext, CoreError, Entities, Money, PaymentMethod, Period, ValidationError};

use super::HandlerResult;
use super::Reply;
use crate::formatter::SalesSummary;
use crate::AppState;

const TOP_PRODUCTS: usize = 5;

/// `period` entity, `today` when absent.
pub(crate) fn requested_period(entities: &Entities) -> Result<Period, ValidationError> {
    match entities.text("period") {
        None => Ok(Period::default()),
        Some(text) => Period::parse(&text).ok_or_else(|| ValidationError::InvalidFormat {
            field: "period".to_string(),
            reason: "expected today, yesterday, this week or this month".to_string(),
        }),
    }
}

pub async fn sales_summary(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let period = requested_period(entities)?;
    let (from, to) = period.range(Utc::now(), state.offset);

    let sales = state.store.sales_between(&ctx.tenant_id, from, to).await?;
    let transactions = state.store.transactions_between(&ctx.tenant_id, from, to).await?;

    let total: Money = sales.iter().map(|s| s.total()).sum();

    let by_payment: Vec<(PaymentMethod, usize, Money)> = PaymentMethod::ALL
        .into_iter()
        .filter_map(|method| {
            let matching: Vec<_> = sales.iter().filter(|s| s.payment_method == method).collect();
            if matching.is_empty() {
                None
            } else {
                Some((method, matching.len(), matching.iter().map(|s| s.total()).sum()))
            }
        })
        .collect();

    let mut products: HashMap<&str, (i64, Money)> = HashMap::new();
    for t in &transactions {
        let entry = products.entry(t.product_name.as_str()).or_insert((0, Money::zero()));
        entry.0 += t.quantity;
        entry.1 += Money::from_cents(t.total_cents);
    }
    let mut top_products: Vec<(String, i64, Money)> = products
        .into_iter()
        .map(|(name, (quantity, revenue))| (name.to_string(), quantity, revenue))
        .collect();
    top_products.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.2.cmp(&a.2)).then_with(|| a.0.cmp(&b.0)));
    top_products.truncate(TOP_PRODUCTS);

    let summary = SalesSummary {
        period,
        count: sales.len(),
        total,
        by_payment,
        top_products,
    };

    let data = json!({
        "period": period,
        "count": summary.count,
        "total_cents": total.cents(),
        "by_payment_method": summary
            .by_payment
            .iter()
            .map(|(method, count, amount)| json!({
                "payment_method": method,
                "count": count,
                "total_cents": amount.cents(),
            }))
            .collect::<Vec<_>>(),
        "top_products": summary
            .top_products
            .iter()
            .map(|(name, quantity, revenue)| json!({
                "product": name,
                "quantity": quantity,
                "revenue_cents": revenue.cents(),
            }))
            .collect::<Vec<_>>(),
    });

    Ok(Reply::with_data(state.formatter.sales_summary(&summary), data))
}

pub async fn sale_details(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let store = state.store.as_ref();

    let sale = match entities.first_text(&["sale_number", "number"]) {
        Some(raw) => {
            let number = sanitize_input(&raw, 40).to_uppercase();
            store
                .find_sale_by_number(&ctx.tenant_id, &number)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "sale",
                    key: number,
                })?
        }
        None => match store.latest_sale(&ctx.tenant_id).await? {
            Some(sale) => sale,
            None => return Ok(Reply::text("No sales recorded yet.")),
        },
    };

    let items = store.sale_items(&ctx.tenant_id, &sale.id).await?;
    let receipt = store.receipt_for_sale(&ctx.tenant_id, &sale.id).await?;

    let message = state.formatter.sale_details(&sale, &items, receipt.as_ref());
    Ok(Reply::with_data(
        message,
        json!({
            "sale": sale,
            "items": items,
            "receipt_number": receipt.map(|r| r.receipt_number),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::sale::record_sale;
    use crate::handlers::test_support::{ctx, entities, product, state};
    use serde_json::json;
    use tally_db::MemoryStore;

    #[tokio::test]
    async fn test_summary_groups_payments_and_products() {
        let store = MemoryStore::new();
        store.add_inventory_item(product("Cement (50kg bag)", 50, 75_000)).await;
        store.add_inventory_item(product("Cooking Oil 1L", 50, 30_000)).await;
        let state = state(&store);
        let cashier = ctx("u1", "cashier");

        for request in [
            json!({"product": "cement", "quantity": 4, "amount": 3000, "payment_method": "mpesa"}),
            json!({"product": "oil", "quantity": 1, "amount": 300}),
            json!({"product": "oil", "quantity": 2, "amount": 600}),
        ] {
            record_sale(&state, &cashier, &entities(request)).await.unwrap();
        }

        let reply = sales_summary(&state, &ctx("u2", "manager"), &entities(json!({}))).await.unwrap();
        assert!(reply.message.starts_with("Sales today: 3 sales totalling KES 3,900.00"));
        assert!(reply.message.contains("- Cash: KES 900.00 (2)"));
        assert!(reply.message.contains("- Mobile Money: KES 3,000.00 (1)"));

        let data = reply.data.unwrap();
        assert_eq!(data["top_products"][0]["product"], "Cement (50kg bag)");
        assert_eq!(data["top_products"][1]["quantity"], 3);
    }

    #[tokio::test]
    async fn test_summary_rejects_unknown_period() {
        let store = MemoryStore::new();
        let state = state(&store);

        let err = sales_summary(&state, &ctx("u1", "manager"), &entities(json!({"period": "last decade"})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(store.call_count(), 0);

        let empty = sales_summary(&state, &ctx("u1", "manager"), &entities(json!({"period": "yesterday"})))
            .await
            .unwrap();
        assert_eq!(empty.message, "No sales recorded yesterday.");
    }

    #[tokio::test]
    async fn test_sale_details_by_number_and_latest() {
        let store = MemoryStore::new();
        store.add_inventory_item(product("Cement (50kg bag)", 50, 75_000)).await;
        let state = state(&store);

        let recorded = record_sale(
            &state,
            &ctx("u1", "cashier"),
            &entities(json!({"product": "cement", "quantity": 2, "amount": 1500, "customer_name": "Baraka"})),
        )
        .await
        .unwrap();
        let number = recorded.data.unwrap()["sale_number"].as_str().unwrap().to_string();

        let latest = sale_details(&state, &ctx("u1", "viewer"), &entities(json!({}))).await.unwrap();
        assert!(latest.message.starts_with(&format!("Sale {number}")));
        assert!(latest.message.contains("Customer: Baraka"));
        assert!(latest.message.contains("2 x Cement (50kg bag) @ KES 750.00 = KES 1,500.00"));
        assert!(latest.message.contains("Receipt: RCP-"));

        let by_number = sale_details(
            &state,
            &ctx("u1", "viewer"),
            &entities(json!({"sale_number": number.to_lowercase()})),
        )
        .await
        .unwrap();
        assert_eq!(by_number.message, latest.message);

        let err = sale_details(&state, &ctx("u1", "viewer"), &entities(json!({"sale_number": "SALE-1999-0001"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No sale found matching 'SALE-1999-0001'");
    }
}
