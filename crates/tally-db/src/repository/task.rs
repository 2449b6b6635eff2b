//! Task writes and lookups.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::debug;

use tally_core::{Task, TaskStatus};

use crate::error::StoreResult;
use crate::store::TaskStore;
use crate::PgStore;

#[derive(Debug, Clone, sqlx::FromRow)]
struct TaskRecord {
    id: String,
    tenant_id: String,
    title: String,
    description: Option<String>,
    assigned_to: Option<String>,
    assignee_name: Option<String>,
    status: String,
    due_date: Option<NaiveDate>,
    created_by: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<TaskRecord> for Task {
    fn from(r: TaskRecord) -> Self {
        Task {
            id: r.id,
            tenant_id: r.tenant_id,
            title: r.title,
            description: r.description,
            assigned_to: r.assigned_to,
            assignee_name: r.assignee_name,
            status: TaskStatus::from_label(&r.status),
            due_date: r.due_date,
            created_by: r.created_by,
            created_at: r.created_at,
            completed_at: r.completed_at,
        }
    }
}

const TASK_COLUMNS: &str = "id, tenant_id, title, description, assigned_to, assignee_name, status, \
     due_date, created_by, created_at, completed_at";

#[derive(Debug, Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        TaskRepository { pool }
    }

    pub async fn insert(&self, task: &Task) -> StoreResult<()> {
        debug!(id = %task.id, title = %task.title, "Creating task");

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, tenant_id, title, description, assigned_to, assignee_name,
                status, due_date, created_by, created_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&task.id)
        .bind(&task.tenant_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.assigned_to)
        .bind(&task.assignee_name)
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(&task.created_by)
        .bind(task.created_at)
        .bind(task.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn open(&self, tenant_id: &str, assigned_to: Option<&str>) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE tenant_id = $1 AND status <> 'completed' \
               AND ($2::TEXT IS NULL OR assigned_to = $2) \
             ORDER BY due_date NULLS LAST, created_at"
        );
        let records = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(tenant_id)
            .bind(assigned_to)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Task::from).collect())
    }

    pub async fn search(
        &self,
        tenant_id: &str,
        pattern: &str,
        assigned_to: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<Task>> {
        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE tenant_id = $1 AND title ILIKE $2 ESCAPE '\'
              AND ($3::TEXT IS NULL OR assigned_to = $3)
            ORDER BY (status = 'completed'), created_at DESC
            LIMIT $4
            "#
        );
        let records = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(tenant_id)
            .bind(pattern)
            .bind(assigned_to)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Task::from).collect())
    }

    pub async fn complete(&self, tenant_id: &str, task_id: &str, completed_at: DateTime<Utc>) -> StoreResult<()> {
        debug!(task_id = %task_id, "Completing task");

        sqlx::query("UPDATE tasks SET status = 'completed', completed_at = $3 WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(task_id)
            .bind(completed_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.tasks().insert(task).await
    }

    async fn open_tasks(&self, tenant_id: &str, assigned_to: Option<&str>) -> StoreResult<Vec<Task>> {
        self.tasks().open(tenant_id, assigned_to).await
    }

    async fn search_tasks(
        &self,
        tenant_id: &str,
        pattern: &str,
        assigned_to: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<Task>> {
        self.tasks().search(tenant_id, pattern, assigned_to, limit).await
    }

    async fn complete_task(&self, tenant_id: &str, task_id: &str, completed_at: DateTime<Utc>) -> StoreResult<()> {
        self.tasks().complete(tenant_id, task_id, completed_at).await
    }
}
