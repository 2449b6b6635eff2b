//! # Intent Router
//!
//! ```text
//! ExecuteRequest + Caller
//!     │
//!     ├── empty tenant_id / user_id / intent ──► 400
//!     ├── token subject ≠ context.user_id     ──► 403
//!     ├── membership                          ──► 403 / 500
//!     ├── intent name unknown                 ──► 200 success:false UNKNOWN_INTENT
//!     ├── role may not use intent             ──► 403
//!     ▼
//! dispatch ──► handler ──► ExecuteResponse { execution_time_ms }
//! ```

use std::time::Instant;
use tracing::{info, warn};

use tally_core::{AuthorizedContext, Entities, Intent, UnknownIntent};

use crate::auth::Caller;
use crate::authorizer::{check_permission, verify_membership};
use crate::error::ApiError;
use crate::handlers::{
    customer, expense, help, inventory, overview, sale, sales_report, staff, tasks, HandlerResult,
};
use crate::response::{ExecuteRequest, ExecuteResponse};
use crate::AppState;

/// Calls the handler for `intent`.
pub async fn dispatch(state: &AppState, intent: Intent, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    match intent {
        Intent::RecordSale => sale::record_sale(state, ctx, entities).await,
        Intent::CheckStock => inventory::check_stock(state, ctx, entities).await,
        Intent::CheckPrice => inventory::check_price(state, ctx, entities).await,
        Intent::ListProducts => inventory::list_products(state, ctx, entities).await,
        Intent::LowStockReport => inventory::low_stock_report(state, ctx, entities).await,
        Intent::SalesSummary => sales_report::sales_summary(state, ctx, entities).await,
        Intent::SaleDetails => sales_report::sale_details(state, ctx, entities).await,
        Intent::CustomerLookup => customer::customer_lookup(state, ctx, entities).await,
        Intent::RecordExpense => expense::record_expense(state, ctx, entities).await,
        Intent::ExpenseSummary => expense::expense_summary(state, ctx, entities).await,
        Intent::BusinessOverview => overview::business_overview(state, ctx, entities).await,
        Intent::ClockIn => staff::clock_in(state, ctx, entities).await,
        Intent::ClockOut => staff::clock_out(state, ctx, entities).await,
        Intent::AttendanceSummary => staff::attendance_summary(state, ctx, entities).await,
        Intent::ListEmployees => staff::list_employees(state, ctx, entities).await,
        Intent::EmployeeDetails => staff::employee_details(state, ctx, entities).await,
        Intent::CreateTask => tasks::create_task(state, ctx, entities).await,
        Intent::ListTasks => tasks::list_tasks(state, ctx, entities).await,
        Intent::CompleteTask => tasks::complete_task(state, ctx, entities).await,
        Intent::Help => help::help(state, ctx, entities).await,
    }
}

/// Runs one execute request for an already-authenticated caller.
pub async fn execute(state: &AppState, caller: &Caller, request: ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
    let ExecuteRequest {
        intent,
        entities,
        context,
    } = request;

    for (field, value) in [
        ("intent", intent.as_str()),
        ("context.tenant_id", context.tenant_id.as_str()),
        ("context.user_id", context.user_id.as_str()),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{field} is required")));
        }
    }

    caller.check_user(&context.user_id)?;
    let ctx = verify_membership(state.store.as_ref(), context).await?;

    let started = Instant::now();
    let intent: Intent = match intent.parse() {
        Ok(intent) => intent,
        Err(unknown) => {
            let unknown: UnknownIntent = unknown;
            info!(tenant_id = %ctx.tenant_id, intent = %unknown.0, "Unknown intent");
            return Ok(ExecuteResponse::failure(unknown.to_string(), "UNKNOWN_INTENT")
                .with_elapsed_ms(elapsed_ms(started)));
        }
    };

    check_permission(&ctx, intent)?;

    let outcome = dispatch(state, intent, &ctx, &entities).await;
    let elapsed = elapsed_ms(started);

    let response = match outcome {
        Ok(reply) => {
            info!(
                tenant_id = %ctx.tenant_id,
                user_id = %ctx.user_id,
                intent = %intent,
                elapsed_ms = elapsed,
                "Intent executed"
            );
            ExecuteResponse::success(reply.message, reply.data)
        }
        Err(e) => {
            let code = e.code();
            if intent.is_write() {
                warn!(tenant_id = %ctx.tenant_id, intent = %intent, code = %code, error = %e, "Intent failed");
            } else {
                info!(tenant_id = %ctx.tenant_id, intent = %intent, code = %code, error = %e, "Intent failed");
            }
            ExecuteResponse::failure(e.to_string(), code)
        }
    };

    Ok(response.with_elapsed_ms(elapsed))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
