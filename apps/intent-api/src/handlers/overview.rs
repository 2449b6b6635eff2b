//! `business_overview`: today's sales, expenses, net and stock alerts.

use chrono::{Duration, Utc};
use serde_json::json;

use tally_core::period::local_date;
use tally_core::{AuthorizedContext, Entities, Money, Period};

use super::{HandlerResult, Reply};
use crate::formatter::Overview;
use crate::AppState;

pub async fn business_overview(state: &AppState, ctx: &AuthorizedContext, _entities: &Entities) -> HandlerResult {
    let now = Utc::now();
    let today = local_date(now, state.offset);
    let (from, to) = Period::Today.range(now, state.offset);

    let store = state.store.as_ref();
    let sales = store.sales_between(&ctx.tenant_id, from, to).await?;
    let expenses = store
        .expenses_between(&ctx.tenant_id, today, today + Duration::days(1))
        .await?;
    let low_stock = store.low_stock_items(&ctx.tenant_id).await?;

    let overview = Overview {
        date: today,
        sales_count: sales.len(),
        sales_total: sales.iter().map(|s| s.total()).sum(),
        expenses_total: expenses.iter().map(|e| Money::from_cents(e.amount_cents)).sum(),
        low_stock: low_stock.iter().map(|i| i.name.clone()).collect(),
    };

    Ok(Reply::with_data(
        state.formatter.business_overview(&overview),
        json!({
            "date": overview.date,
            "sales_count": overview.sales_count,
            "sales_total_cents": overview.sales_total.cents(),
            "expenses_total_cents": overview.expenses_total.cents(),
            "net_cents": overview.net().cents(),
            "low_stock_count": overview.low_stock.len(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::expense::record_expense;
    use crate::handlers::sale::record_sale;
    use crate::handlers::test_support::{ctx, entities, product, state};
    use serde_json::json;
    use tally_db::MemoryStore;

    #[tokio::test]
    async fn test_overview_combines_sales_expenses_and_stock() {
        let store = MemoryStore::new();
        store.add_inventory_item(product("Cement (50kg bag)", 7, 75_000)).await;
        store.add_inventory_item(product("Cooking Oil 1L", 40, 30_000)).await;
        let state = state(&store);
        let admin = ctx("u1", "admin");

        record_sale(&state, &admin, &entities(json!({"product": "cement", "quantity": 2, "amount": 1500})))
            .await
            .unwrap();
        record_expense(&state, &admin, &entities(json!({"amount": 400, "description": "fuel"})))
            .await
            .unwrap();

        let reply = business_overview(&state, &admin, &entities(json!({}))).await.unwrap();
        assert!(reply.message.contains("Sales: KES 1,500.00 (1 sale)"));
        assert!(reply.message.contains("Expenses: KES 400.00"));
        assert!(reply.message.contains("Net: KES 1,100.00"));
        assert!(reply.message.contains("Low stock (1): Cement (50kg bag)"));

        let data = reply.data.unwrap();
        assert_eq!(data["net_cents"], 110_000);
        assert_eq!(data["low_stock_count"], 1);
    }
}
