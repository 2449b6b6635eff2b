//! Read-only inventory lookups.

use serde_json::json;

use tally_core::product_query::{normalize_product_query, ProductQuery, LOOKUP_SEARCH_LIMIT};
use tally_core::{AuthorizedContext, Entities, InventoryItem, ValidationError};

use super::{bounded_integer, HandlerError, HandlerResult, Reply};
use crate::AppState;

const DEFAULT_PRODUCT_LIST: i64 = 20;
const MAX_PRODUCT_LIST: i64 = 100;

fn product_query(entities: &Entities) -> Result<ProductQuery, ValidationError> {
    entities
        .first_text(&["product", "product_name", "item", "query"])
        .as_deref()
        .and_then(normalize_product_query)
        .ok_or_else(|| ValidationError::Required {
            field: "product".to_string(),
        })
}

async fn search(state: &AppState, ctx: &AuthorizedContext, query: &ProductQuery) -> Result<Vec<InventoryItem>, HandlerError> {
    state
        .store
        .search_inventory(&ctx.tenant_id, &query.pattern, LOOKUP_SEARCH_LIMIT)
        .await
        .map_err(|e| HandlerError::store(format!("Could not look up '{}'", query.raw), e))
}

pub async fn check_stock(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let query = product_query(entities)?;
    let items = search(state, ctx, &query).await?;

    let rows: Vec<_> = items
        .iter()
        .map(|i| {
            json!({
                "id": i.id,
                "name": i.name,
                "current_stock": i.current_stock,
                "reorder_level": i.reorder_level,
                "low_stock": i.is_low_stock(),
            })
        })
        .collect();

    Ok(Reply::with_data(
        state.formatter.stock_levels(&query.raw, &items),
        json!({ "query": query.raw, "items": rows }),
    ))
}

pub async fn check_price(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let query = product_query(entities)?;
    let items = search(state, ctx, &query).await?;

    let rows: Vec<_> = items
        .iter()
        .map(|i| json!({ "id": i.id, "name": i.name, "unit_price_cents": i.unit_price_cents }))
        .collect();

    Ok(Reply::with_data(
        state.formatter.prices(&query.raw, &items),
        json!({ "query": query.raw, "items": rows }),
    ))
}

pub async fn list_products(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let limit = bounded_integer(entities, "limit", DEFAULT_PRODUCT_LIST, MAX_PRODUCT_LIST)?;
    let items = state.store.list_inventory(&ctx.tenant_id, limit).await?;

    Ok(Reply::with_data(
        state.formatter.product_list(&items),
        json!({ "count": items.len(), "items": items }),
    ))
}

pub async fn low_stock_report(state: &AppState, ctx: &AuthorizedContext, _entities: &Entities) -> HandlerResult {
    let items = state.store.low_stock_items(&ctx.tenant_id).await?;

    Ok(Reply::with_data(
        state.formatter.low_stock(&items),
        json!({ "count": items.len(), "items": items }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{ctx, entities, product, state};
    use serde_json::json;
    use tally_db::MemoryStore;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_inventory_item(product("Cement (50kg bag)", 40, 75_000)).await;
        store.add_inventory_item(product("Cooking Oil 1L", 3, 30_000)).await;
        store.add_inventory_item(product("100% Cotton Rag", 12, 5_000)).await;
        store
    }

    #[tokio::test]
    async fn test_check_stock_flags_low_items() {
        let store = seeded().await;
        let state = state(&store);

        let reply = check_stock(&state, &ctx("u1", "staff"), &entities(json!({"product": "oil"})))
            .await
            .unwrap();
        assert!(reply.message.contains("Cooking Oil 1L: 3 in stock (low"));
        assert_eq!(reply.data.unwrap()["items"][0]["low_stock"], true);
    }

    #[tokio::test]
    async fn test_percent_is_not_a_wildcard() {
        let store = seeded().await;
        let state = state(&store);

        let reply = check_stock(&state, &ctx("u1", "staff"), &entities(json!({"product": "100%"})))
            .await
            .unwrap();
        let data = reply.data.unwrap();
        let items = data["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "100% Cotton Rag");
    }

    #[tokio::test]
    async fn test_no_match_message_names_query() {
        let store = seeded().await;
        let state = state(&store);

        let reply = check_price(&state, &ctx("u1", "staff"), &entities(json!({"product": "paint"})))
            .await
            .unwrap();
        assert_eq!(reply.message, "No products found matching 'paint'.");
    }

    #[tokio::test]
    async fn test_check_price_shows_currency() {
        let store = seeded().await;
        let state = state(&store);

        let reply = check_price(&state, &ctx("u1", "staff"), &entities(json!({"product": "cement"})))
            .await
            .unwrap();
        assert!(reply.message.contains("Cement (50kg bag): KES 750.00"));
    }

    #[tokio::test]
    async fn test_missing_product_is_validation_error() {
        let store = seeded().await;
        let state = state(&store);

        let err = check_stock(&state, &ctx("u1", "staff"), &entities(json!({}))).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_and_low_stock() {
        let store = seeded().await;
        let state = state(&store);

        let listed = list_products(&state, &ctx("u1", "staff"), &entities(json!({}))).await.unwrap();
        assert_eq!(listed.data.unwrap()["count"], 3);

        let low = low_stock_report(&state, &ctx("u1", "manager"), &entities(json!({}))).await.unwrap();
        assert!(low.message.starts_with("1 product at or below reorder level"));
        assert!(low.message.contains("Cooking Oil 1L"));

        let err = list_products(&state, &ctx("u1", "staff"), &entities(json!({"limit": 0})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
