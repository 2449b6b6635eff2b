//! Expense recording and period summaries.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use tally_core::entities::ExpenseRequest;
use tally_core::period::local_date;
use tally_core::{new_id, AuthorizedContext, Entities, Expense, ExpenseCategory, Money};

use super::sales_report::requested_period;
use super::{HandlerError, HandlerResult, Reply};
use crate::formatter::ExpenseSummary;
use crate::AppState;

pub async fn record_expense(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let request = ExpenseRequest::from_entities(entities)?;
    let now = Utc::now();

    let expense = Expense {
        id: new_id(),
        tenant_id: ctx.tenant_id.clone(),
        category: request.category,
        amount_cents: request.amount.cents(),
        vendor_name: request.vendor,
        description: request.description,
        date_incurred: request.date.unwrap_or_else(|| local_date(now, state.offset)),
        recorded_by: ctx.user_id.clone(),
        created_at: now,
    };

    state.store.insert_expense(&expense).await.map_err(|e| {
        HandlerError::store(
            format!(
                "Could not record the expense of {} for {}",
                state.formatter.money(request.amount),
                expense.description
            ),
            e,
        )
    })?;

    info!(
        tenant_id = %ctx.tenant_id,
        category = %expense.category,
        amount_cents = expense.amount_cents,
        "Expense recorded"
    );

    Ok(Reply::with_data(
        state.formatter.expense_recorded(&expense),
        json!({
            "expense_id": expense.id,
            "category": expense.category,
            "amount_cents": expense.amount_cents,
            "date_incurred": expense.date_incurred,
        }),
    ))
}

pub async fn expense_summary(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let period = requested_period(entities)?;
    let (from, to) = period.range(Utc::now(), state.offset);
    let (from, to) = (local_date(from, state.offset), local_date(to, state.offset));

    let expenses = state.store.expenses_between(&ctx.tenant_id, from, to).await?;

    let mut by_category: Vec<(ExpenseCategory, Money)> = ExpenseCategory::ALL
        .into_iter()
        .map(|category| {
            let total: Money = expenses
                .iter()
                .filter(|e| e.category == category)
                .map(|e| Money::from_cents(e.amount_cents))
                .sum();
            (category, total)
        })
        .filter(|(_, total)| !total.is_zero())
        .collect();
    by_category.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let summary = ExpenseSummary {
        period,
        count: expenses.len(),
        total: expenses.iter().map(|e| Money::from_cents(e.amount_cents)).sum(),
        by_category,
    };

    let data = json!({
        "period": period,
        "count": summary.count,
        "total_cents": summary.total.cents(),
        "by_category": summary
            .by_category
            .iter()
            .map(|(category, total)| json!({ "category": category, "total_cents": total.cents() }))
            .collect::<Vec<_>>(),
    });

    Ok(Reply::with_data(state.formatter.expense_summary(&summary), data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{ctx, entities, state, TENANT};
    use serde_json::json;
    use tally_db::{FailPoint, FailureKind, MemoryStore};

    #[tokio::test]
    async fn test_category_inferred_from_description() {
        let store = MemoryStore::new();
        let state = state(&store);

        let reply = record_expense(
            &state,
            &ctx("u1", "manager"),
            &entities(json!({"amount": "KES 2,500", "description": "KPLC electricity token", "vendor": "KPLC"})),
        )
        .await
        .unwrap();

        let expenses = store.expenses(TENANT).await;
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].category, ExpenseCategory::Utilities);
        assert_eq!(expenses[0].amount_cents, 250_000);
        assert!(reply.message.starts_with("Expense recorded: KES 2,500.00 for KPLC electricity token (Utilities)"));
        assert!(reply.message.contains("Paid to: KPLC"));
    }

    #[tokio::test]
    async fn test_unknown_category_falls_back_to_other() {
        let store = MemoryStore::new();
        let state = state(&store);

        record_expense(&state, &ctx("u1", "admin"), &entities(json!({"amount": 100, "description": "gift"})))
            .await
            .unwrap();
        assert_eq!(store.expenses(TENANT).await[0].category, ExpenseCategory::Other);
    }

    #[tokio::test]
    async fn test_non_positive_amount_writes_nothing() {
        let store = MemoryStore::new();
        let state = state(&store);

        let err = record_expense(&state, &ctx("u1", "admin"), &entities(json!({"amount": 0, "description": "rent"})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_names_amount() {
        let store = MemoryStore::new();
        store.fail(FailPoint::InsertExpense, FailureKind::Timeout, 1).await;
        let state = state(&store);

        let err = record_expense(&state, &ctx("u1", "admin"), &entities(json!({"amount": 900, "description": "fuel"})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "TIMEOUT");
        assert!(err.to_string().contains("KES 900.00 for fuel"));
    }

    #[tokio::test]
    async fn test_summary_totals_by_category() {
        let store = MemoryStore::new();
        let state = state(&store);
        let manager = ctx("u1", "manager");

        for request in [
            json!({"amount": 1000, "category": "rent"}),
            json!({"amount": 300, "description": "diesel for lorry"}),
            json!({"amount": 200, "description": "boda fare"}),
        ] {
            record_expense(&state, &manager, &entities(request)).await.unwrap();
        }

        let reply = expense_summary(&state, &manager, &entities(json!({"period": "this month"})))
            .await
            .unwrap();
        assert!(reply.message.starts_with("Expenses this month: 3 totalling KES 1,500.00"));
        assert!(reply.message.contains("- Rent: KES 1,000.00\n- Transport: KES 500.00"));
    }
}
