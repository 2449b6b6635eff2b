//! Attendance and the employee roster.
//!
//! Clock-in and clock-out act on the employee linked to the caller's
//! `user_id`; a caller cannot clock someone else in.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use tally_core::period::local_date;
use tally_core::sanitize::{escape_like, sanitize_input};
use tally_core::{
    new_id, AttendanceRecord, AuthorizedContext, CoreError, Employee, Entities, Period, ValidationError,
};

use super::{HandlerError, HandlerResult, Reply};
use crate::AppState;

const NAME_QUERY_LEN: usize = 60;

async fn caller_employee(state: &AppState, ctx: &AuthorizedContext) -> Result<Employee, HandlerError> {
    state
        .store
        .employee_for_user(&ctx.tenant_id, &ctx.user_id)
        .await?
        .ok_or(HandlerError::Business(CoreError::NoEmployeeRecord))
}

pub async fn clock_in(state: &AppState, ctx: &AuthorizedContext, _entities: &Entities) -> HandlerResult {
    let employee = caller_employee(state, ctx).await?;
    let store = state.store.as_ref();

    if let Some(open) = store.open_attendance(&ctx.tenant_id, &employee.id).await? {
        return Err(CoreError::AlreadyClockedIn {
            employee: employee.full_name,
            since: state.formatter.time(open.clock_in),
        }
        .into());
    }

    let now = Utc::now();
    let record = AttendanceRecord {
        id: new_id(),
        tenant_id: ctx.tenant_id.clone(),
        employee_id: employee.id.clone(),
        employee_name: employee.full_name.clone(),
        clock_in: now,
        clock_out: None,
        hours_worked: None,
    };

    match store.insert_attendance(&record).await {
        Ok(()) => {}
        // a concurrent clock-in won the open-shift index
        Err(e) if e.is_unique_violation() => {
            return Err(CoreError::AlreadyClockedIn {
                employee: employee.full_name,
                since: state.formatter.time(now),
            }
            .into())
        }
        Err(e) => {
            return Err(HandlerError::store(
                format!("Could not clock in {}", employee.full_name),
                e,
            ))
        }
    }

    info!(tenant_id = %ctx.tenant_id, employee_id = %employee.id, "Clocked in");
    Ok(Reply::with_data(
        state.formatter.clocked_in(&record),
        json!({ "attendance_id": record.id, "employee_id": employee.id, "clock_in": record.clock_in }),
    ))
}

pub async fn clock_out(state: &AppState, ctx: &AuthorizedContext, _entities: &Entities) -> HandlerResult {
    let employee = caller_employee(state, ctx).await?;
    let store = state.store.as_ref();

    let open = store
        .open_attendance(&ctx.tenant_id, &employee.id)
        .await?
        .ok_or_else(|| CoreError::NotClockedIn {
            employee: employee.full_name.clone(),
        })?;

    let now = Utc::now();
    let hours = open.hours_until(now);
    store
        .close_attendance(&ctx.tenant_id, &open.id, now, hours)
        .await
        .map_err(|e| HandlerError::store(format!("Could not clock out {}", employee.full_name), e))?;

    info!(tenant_id = %ctx.tenant_id, employee_id = %employee.id, hours, "Clocked out");
    Ok(Reply::with_data(
        state.formatter.clocked_out(&open, now, hours),
        json!({ "attendance_id": open.id, "employee_id": employee.id, "hours_worked": hours }),
    ))
}

pub async fn attendance_summary(state: &AppState, ctx: &AuthorizedContext, _entities: &Entities) -> HandlerResult {
    let now = Utc::now();
    let (from, to) = Period::Today.range(now, state.offset);
    let records = state.store.attendance_between(&ctx.tenant_id, from, to).await?;

    let present = records.iter().filter(|r| r.is_open()).count();
    Ok(Reply::with_data(
        state.formatter.attendance(local_date(now, state.offset), &records, now),
        json!({ "shifts": records.len(), "clocked_in": present, "records": records }),
    ))
}

pub async fn list_employees(state: &AppState, ctx: &AuthorizedContext, _entities: &Entities) -> HandlerResult {
    let employees = state.store.list_employees(&ctx.tenant_id).await?;
    Ok(Reply::with_data(
        state.formatter.employees(&employees),
        json!({ "count": employees.len(), "employees": employees }),
    ))
}

pub async fn employee_details(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let name = entities
        .first_text(&["employee", "employee_name", "name"])
        .map(|raw| sanitize_input(&raw, NAME_QUERY_LEN))
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ValidationError::Required {
            field: "employee".to_string(),
        })?;

    let store = state.store.as_ref();
    let pattern = format!("%{}%", escape_like(&name.to_lowercase()));
    let matches = store.search_employees(&ctx.tenant_id, &pattern).await?;
    let employee = matches.first().ok_or_else(|| CoreError::NotFound {
        entity: "employee",
        key: name.clone(),
    })?;

    let open_shift = store.open_attendance(&ctx.tenant_id, &employee.id).await?;

    let mut message = state.formatter.employee_details(employee, open_shift.as_ref());
    if matches.len() > 1 {
        let others: Vec<&str> = matches[1..].iter().map(|e| e.full_name.as_str()).collect();
        message.push_str(&format!("\nAlso matching '{name}': {}", others.join(", ")));
    }

    Ok(Reply::with_data(
        message,
        json!({
            "employee": employee,
            "clocked_in": open_shift.is_some(),
            "matches": matches.len(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{ctx, employee, entities, state, TENANT};
    use serde_json::json;
    use tally_db::MemoryStore;

    #[tokio::test]
    async fn test_clock_in_then_out() {
        let store = MemoryStore::new();
        store.add_employee(employee("Amina Njeri", Some("u1"))).await;
        let state = state(&store);
        let staff = ctx("u1", "staff");

        let reply = clock_in(&state, &staff, &entities(json!({}))).await.unwrap();
        assert!(reply.message.starts_with("Amina Njeri clocked in at"));

        let again = clock_in(&state, &staff, &entities(json!({}))).await.unwrap_err();
        assert_eq!(again.code(), "ALREADY_CLOCKED_IN");

        let out = clock_out(&state, &staff, &entities(json!({}))).await.unwrap();
        assert!(out.message.contains("Shift: 0.00 hours"));

        let records = store.attendance(TENANT).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].clock_out.is_some());

        let err = clock_out(&state, &staff, &entities(json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Amina Njeri is not clocked in");
    }

    #[tokio::test]
    async fn test_unlinked_user_cannot_clock_in() {
        let store = MemoryStore::new();
        store.add_employee(employee("Amina Njeri", None)).await;
        let state = state(&store);

        let err = clock_in(&state, &ctx("u9", "staff"), &entities(json!({}))).await.unwrap_err();
        assert_eq!(err.code(), "NO_EMPLOYEE_RECORD");
        assert!(store.attendance(TENANT).await.is_empty());
    }

    #[tokio::test]
    async fn test_attendance_summary_counts_open_shifts() {
        let store = MemoryStore::new();
        store.add_employee(employee("Amina Njeri", Some("u1"))).await;
        store.add_employee(employee("Brian Kip", Some("u2"))).await;
        let state = state(&store);

        clock_in(&state, &ctx("u1", "staff"), &entities(json!({}))).await.unwrap();
        clock_in(&state, &ctx("u2", "staff"), &entities(json!({}))).await.unwrap();
        clock_out(&state, &ctx("u2", "staff"), &entities(json!({}))).await.unwrap();

        let reply = attendance_summary(&state, &ctx("u3", "manager"), &entities(json!({}))).await.unwrap();
        assert!(reply.message.contains("2 shifts, 1 still clocked in"));
        assert!(reply.message.contains("Amina Njeri: in since"));
    }

    #[tokio::test]
    async fn test_roster_and_details() {
        let store = MemoryStore::new();
        store.add_employee(employee("Amina Njeri", Some("u1"))).await;
        store.add_employee(employee("Brian Kip", None)).await;
        let state = state(&store);
        let manager = ctx("u3", "manager");

        let roster = list_employees(&state, &manager, &entities(json!({}))).await.unwrap();
        assert_eq!(roster.message, "2 employees:\n- Amina Njeri (Sales)\n- Brian Kip (Sales)");

        let details = employee_details(&state, &manager, &entities(json!({"employee": "brian"})))
            .await
            .unwrap();
        assert!(details.message.starts_with("Brian Kip\nPosition: Sales"));
        assert!(details.message.ends_with("Not clocked in"));

        let err = employee_details(&state, &manager, &entities(json!({"employee": "Zawadi"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No employee found matching 'Zawadi'");
    }
}
