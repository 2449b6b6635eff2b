//! `customer_lookup`: a customer's purchases by name or phone.

use serde_json::json;

use tally_core::sanitize::{escape_like, sanitize_input};
use tally_core::{AuthorizedContext, Entities, Money, ValidationError};

use super::{HandlerResult, Reply};
use crate::AppState;

const CUSTOMER_QUERY_LEN: usize = 100;
const CUSTOMER_SALES_LIMIT: i64 = 20;

pub async fn customer_lookup(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let query = entities
        .first_text(&["customer_name", "customer", "customer_phone", "phone", "query"])
        .map(|raw| sanitize_input(&raw, CUSTOMER_QUERY_LEN))
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ValidationError::Required {
            field: "customer".to_string(),
        })?;

    let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
    let sales = state
        .store
        .sales_for_customer(&ctx.tenant_id, &pattern, CUSTOMER_SALES_LIMIT)
        .await?;

    let total: Money = sales.iter().map(|s| s.total()).sum();
    Ok(Reply::with_data(
        state.formatter.customer_history(&query, &sales),
        json!({
            "query": query,
            "count": sales.len(),
            "total_cents": total.cents(),
            "sales": sales,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::sale::record_sale;
    use crate::handlers::test_support::{ctx, entities, state};
    use serde_json::json;
    use tally_db::MemoryStore;

    #[tokio::test]
    async fn test_lookup_by_name_and_phone() {
        let store = MemoryStore::new();
        let state = state(&store);
        let cashier = ctx("u1", "cashier");

        for request in [
            json!({"product": "delivery", "amount": 500, "customer_name": "Mary Wanjiku", "customer_phone": "0712345678"}),
            json!({"product": "transport", "amount": 1200, "customer_name": "Mary Wanjiku"}),
            json!({"product": "delivery", "amount": 800, "customer_name": "John Otieno"}),
        ] {
            record_sale(&state, &cashier, &entities(request)).await.unwrap();
        }

        let reply = customer_lookup(&state, &cashier, &entities(json!({"customer": "mary"}))).await.unwrap();
        assert!(reply.message.starts_with("2 purchases found for 'mary', totalling KES 1,700.00"));

        let by_phone = customer_lookup(&state, &cashier, &entities(json!({"phone": "0712"}))).await.unwrap();
        assert_eq!(by_phone.data.unwrap()["count"], 1);
    }

    #[tokio::test]
    async fn test_missing_customer_is_rejected() {
        let store = MemoryStore::new();
        let state = state(&store);

        let err = customer_lookup(&state, &ctx("u1", "cashier"), &entities(json!({"customer": "  "})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let none = customer_lookup(&state, &ctx("u1", "cashier"), &entities(json!({"customer": "Zed"})))
            .await
            .unwrap();
        assert_eq!(none.message, "No purchases found for 'Zed'.");
    }
}
