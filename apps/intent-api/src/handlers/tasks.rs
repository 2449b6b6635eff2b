//! Task creation, listing and completion.
//!
//! Cashiers and staff only see (and complete) tasks assigned to their own
//! employee record; other roles see every open task.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use tally_core::entities::TaskRequest;
use tally_core::sanitize::{escape_like, sanitize_input};
use tally_core::{
    new_id, AuthorizedContext, CoreError, Entities, Role, Task, TaskStatus, ValidationError,
};

use super::{HandlerError, HandlerResult, Reply};
use crate::AppState;

const TASK_QUERY_LEN: usize = 100;
const TASK_SEARCH_LIMIT: i64 = 10;

fn sees_own_tasks_only(ctx: &AuthorizedContext) -> bool {
    matches!(ctx.role.role(), Some(Role::Cashier | Role::Staff))
}

/// Employee id whose tasks the caller is limited to, if any.
async fn task_scope(state: &AppState, ctx: &AuthorizedContext) -> Result<Option<Option<String>>, HandlerError> {
    if !sees_own_tasks_only(ctx) {
        return Ok(None);
    }
    let employee = state.store.employee_for_user(&ctx.tenant_id, &ctx.user_id).await?;
    Ok(Some(employee.map(|e| e.id)))
}

pub async fn create_task(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let request = TaskRequest::from_entities(entities)?;
    let store = state.store.as_ref();

    let assignee = match &request.assignee {
        Some(name) => {
            let pattern = format!("%{}%", escape_like(&sanitize_input(name, TASK_QUERY_LEN).to_lowercase()));
            let found = store
                .search_employees(&ctx.tenant_id, &pattern)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| CoreError::NotFound {
                    entity: "employee",
                    key: name.clone(),
                })?;
            Some(found)
        }
        None => None,
    };

    let task = Task {
        id: new_id(),
        tenant_id: ctx.tenant_id.clone(),
        title: request.title,
        description: request.description,
        assigned_to: assignee.as_ref().map(|e| e.id.clone()),
        assignee_name: assignee.map(|e| e.full_name),
        status: TaskStatus::Pending,
        due_date: request.due_date,
        created_by: ctx.user_id.clone(),
        created_at: Utc::now(),
        completed_at: None,
    };

    store
        .insert_task(&task)
        .await
        .map_err(|e| HandlerError::store(format!("Could not create task '{}'", task.title), e))?;

    info!(tenant_id = %ctx.tenant_id, task_id = %task.id, "Task created");
    Ok(Reply::with_data(
        state.formatter.task_created(&task),
        json!({ "task_id": task.id, "assigned_to": task.assigned_to, "due_date": task.due_date }),
    ))
}

pub async fn list_tasks(state: &AppState, ctx: &AuthorizedContext, _entities: &Entities) -> HandlerResult {
    let scope = task_scope(state, ctx).await?;
    let tasks = match &scope {
        None => state.store.open_tasks(&ctx.tenant_id, None).await?,
        Some(Some(employee_id)) => state.store.open_tasks(&ctx.tenant_id, Some(employee_id)).await?,
        Some(None) => Vec::new(),
    };

    Ok(Reply::with_data(
        state.formatter.tasks(&tasks, scope.is_some()),
        json!({ "count": tasks.len(), "tasks": tasks }),
    ))
}

pub async fn complete_task(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult {
    let fragment = entities
        .first_text(&["title", "task"])
        .map(|raw| sanitize_input(&raw, TASK_QUERY_LEN))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ValidationError::Required {
            field: "title".to_string(),
        })?;

    let store = state.store.as_ref();
    let not_found = || CoreError::NotFound {
        entity: "task",
        key: fragment.clone(),
    };
    let assigned_to = match task_scope(state, ctx).await? {
        None => None,
        Some(Some(employee_id)) => Some(employee_id),
        Some(None) => return Err(not_found().into()),
    };
    let pattern = format!("%{}%", escape_like(&fragment.to_lowercase()));
    let task = store
        .search_tasks(&ctx.tenant_id, &pattern, assigned_to.as_deref(), TASK_SEARCH_LIMIT)
        .await?
        .into_iter()
        .next()
        .ok_or_else(not_found)?;

    if task.status == TaskStatus::Completed {
        return Err(CoreError::TaskAlreadyCompleted { title: task.title }.into());
    }

    let now = Utc::now();
    store
        .complete_task(&ctx.tenant_id, &task.id, now)
        .await
        .map_err(|e| HandlerError::store(format!("Could not complete task '{}'", task.title), e))?;

    info!(tenant_id = %ctx.tenant_id, task_id = %task.id, "Task completed");
    Ok(Reply::with_data(
        state.formatter.task_completed(&task),
        json!({ "task_id": task.id, "completed_at": now }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{ctx, employee, entities, state, TENANT};
    use serde_json::json;
    use tally_db::MemoryStore;

    #[tokio::test]
    async fn test_staff_see_only_their_tasks() {
        let store = MemoryStore::new();
        store.add_employee(employee("Amina Njeri", Some("u1"))).await;
        store.add_employee(employee("Brian Kip", Some("u2"))).await;
        let state = state(&store);
        let manager = ctx("u9", "manager");

        create_task(&state, &manager, &entities(json!({"title": "Restock cement", "assignee": "amina"})))
            .await
            .unwrap();
        create_task(&state, &manager, &entities(json!({"title": "Sweep yard", "assignee": "brian", "due_date": "2026-03-01"})))
            .await
            .unwrap();
        create_task(&state, &manager, &entities(json!({"title": "Call supplier"}))).await.unwrap();

        let all = list_tasks(&state, &manager, &entities(json!({}))).await.unwrap();
        assert!(all.message.starts_with("3 tasks open:"));

        let own = list_tasks(&state, &ctx("u1", "staff"), &entities(json!({}))).await.unwrap();
        assert_eq!(own.message, "1 task assigned to you:\n- Restock cement [Amina Njeri]");

        let nobody = list_tasks(&state, &ctx("u7", "cashier"), &entities(json!({}))).await.unwrap();
        assert_eq!(nobody.message, "No tasks assigned to you.");
    }

    #[tokio::test]
    async fn test_complete_by_fragment() {
        let store = MemoryStore::new();
        store.add_employee(employee("Amina Njeri", Some("u1"))).await;
        let state = state(&store);

        create_task(&state, &ctx("u9", "admin"), &entities(json!({"title": "Restock cement", "assignee": "Amina"})))
            .await
            .unwrap();

        let reply = complete_task(&state, &ctx("u1", "staff"), &entities(json!({"title": "cement"})))
            .await
            .unwrap();
        assert_eq!(reply.message, "Task completed: Restock cement");
        assert_eq!(store.tasks(TENANT).await[0].status, TaskStatus::Completed);

        let again = complete_task(&state, &ctx("u1", "staff"), &entities(json!({"title": "cement"})))
            .await
            .unwrap_err();
        assert_eq!(again.code(), "TASK_ALREADY_COMPLETED");
    }

    #[tokio::test]
    async fn test_staff_cannot_complete_others_tasks() {
        let store = MemoryStore::new();
        store.add_employee(employee("Amina Njeri", Some("u1"))).await;
        store.add_employee(employee("Brian Kip", Some("u2"))).await;
        let state = state(&store);

        create_task(&state, &ctx("u9", "admin"), &entities(json!({"title": "Sweep yard", "assignee": "Brian"})))
            .await
            .unwrap();

        let err = complete_task(&state, &ctx("u1", "staff"), &entities(json!({"title": "sweep"})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_own_task_found_among_many_matches() {
        let store = MemoryStore::new();
        store.add_employee(employee("Amina Njeri", Some("u1"))).await;
        store.add_employee(employee("Brian Kip", Some("u2"))).await;
        let state = state(&store);
        let admin = ctx("u9", "admin");

        create_task(&state, &admin, &entities(json!({"title": "Restock cement", "assignee": "Amina"})))
            .await
            .unwrap();
        for n in 0..12 {
            create_task(&state, &admin, &entities(json!({"title": format!("Restock shelf {n}"), "assignee": "Brian"})))
                .await
                .unwrap();
        }

        let reply = complete_task(&state, &ctx("u1", "staff"), &entities(json!({"title": "restock"})))
            .await
            .unwrap();
        assert_eq!(reply.message, "Task completed: Restock cement");

        let done: Vec<_> = store
            .tasks(TENANT)
            .await
            .into_iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .collect();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].title, "Restock cement");
    }

    #[tokio::test]
    async fn test_unknown_assignee_and_missing_title() {
        let store = MemoryStore::new();
        let state = state(&store);

        let err = create_task(&state, &ctx("u9", "admin"), &entities(json!({"title": "Count stock", "assignee": "Zawadi"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No employee found matching 'Zawadi'");

        let err = create_task(&state, &ctx("u9", "admin"), &entities(json!({"assignee": "Zawadi"})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(store.tasks(TENANT).await.is_empty());
    }
}
