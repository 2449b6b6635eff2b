//! Employees and attendance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use tally_core::{AttendanceRecord, Employee};

use crate::error::StoreResult;
use crate::store::StaffStore;
use crate::PgStore;

#[derive(Debug, Clone, sqlx::FromRow)]
struct EmployeeRecord {
    id: String,
    tenant_id: String,
    user_id: Option<String>,
    full_name: String,
    position: Option<String>,
    phone: Option<String>,
    is_active: bool,
}

impl From<EmployeeRecord> for Employee {
    fn from(r: EmployeeRecord) -> Self {
        Employee {
            id: r.id,
            tenant_id: r.tenant_id,
            user_id: r.user_id,
            full_name: r.full_name,
            position: r.position,
            phone: r.phone,
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AttendanceRow {
    id: String,
    tenant_id: String,
    employee_id: String,
    employee_name: String,
    clock_in: DateTime<Utc>,
    clock_out: Option<DateTime<Utc>>,
    hours_worked: Option<f64>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(r: AttendanceRow) -> Self {
        AttendanceRecord {
            id: r.id,
            tenant_id: r.tenant_id,
            employee_id: r.employee_id,
            employee_name: r.employee_name,
            clock_in: r.clock_in,
            clock_out: r.clock_out,
            hours_worked: r.hours_worked,
        }
    }
}

const EMPLOYEE_COLUMNS: &str = "id, tenant_id, user_id, full_name, position, phone, is_active";
const ATTENDANCE_COLUMNS: &str = "id, tenant_id, employee_id, employee_name, clock_in, clock_out, hours_worked";

#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: PgPool,
}

impl StaffRepository {
    pub fn new(pool: PgPool) -> Self {
        StaffRepository { pool }
    }

    pub async fn employee_for_user(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees \
             WHERE tenant_id = $1 AND user_id = $2 AND is_active LIMIT 1"
        );
        let record = sqlx::query_as::<_, EmployeeRecord>(&sql)
            .bind(tenant_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(Employee::from))
    }

    pub async fn list(&self, tenant_id: &str) -> StoreResult<Vec<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE tenant_id = $1 AND is_active ORDER BY full_name"
        );
        let records = sqlx::query_as::<_, EmployeeRecord>(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Employee::from).collect())
    }

    pub async fn search(&self, tenant_id: &str, pattern: &str) -> StoreResult<Vec<Employee>> {
        let sql = format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS} FROM employees
            WHERE tenant_id = $1 AND is_active AND full_name ILIKE $2 ESCAPE '\'
            ORDER BY full_name
            "#
        );
        let records = sqlx::query_as::<_, EmployeeRecord>(&sql)
            .bind(tenant_id)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(Employee::from).collect())
    }

    pub async fn open_attendance(&self, tenant_id: &str, employee_id: &str) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE tenant_id = $1 AND employee_id = $2 AND clock_out IS NULL \
             ORDER BY clock_in DESC LIMIT 1"
        );
        let record = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(tenant_id)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(AttendanceRecord::from))
    }

    /// Fails with `UniqueViolation` if the employee already has an open shift.
    pub async fn insert_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        debug!(employee_id = %record.employee_id, "Clocking in");

        sqlx::query(
            r#"
            INSERT INTO attendance (id, tenant_id, employee_id, employee_name, clock_in, clock_out, hours_worked)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.id)
        .bind(&record.tenant_id)
        .bind(&record.employee_id)
        .bind(&record.employee_name)
        .bind(record.clock_in)
        .bind(record.clock_out)
        .bind(record.hours_worked)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn close_attendance(
        &self,
        tenant_id: &str,
        record_id: &str,
        clock_out: DateTime<Utc>,
        hours_worked: f64,
    ) -> StoreResult<()> {
        debug!(record_id = %record_id, hours_worked, "Clocking out");

        sqlx::query(
            r#"
            UPDATE attendance SET clock_out = $3, hours_worked = $4
            WHERE tenant_id = $1 AND id = $2 AND clock_out IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(record_id)
        .bind(clock_out)
        .bind(hours_worked)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn attendance_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE tenant_id = $1 AND clock_in >= $2 AND clock_in < $3 ORDER BY clock_in"
        );
        let records = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(records.into_iter().map(AttendanceRecord::from).collect())
    }
}

#[async_trait]
impl StaffStore for PgStore {
    async fn employee_for_user(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Employee>> {
        self.staff().employee_for_user(tenant_id, user_id).await
    }

    async fn list_employees(&self, tenant_id: &str) -> StoreResult<Vec<Employee>> {
        self.staff().list(tenant_id).await
    }

    async fn search_employees(&self, tenant_id: &str, pattern: &str) -> StoreResult<Vec<Employee>> {
        self.staff().search(tenant_id, pattern).await
    }

    async fn open_attendance(&self, tenant_id: &str, employee_id: &str) -> StoreResult<Option<AttendanceRecord>> {
        self.staff().open_attendance(tenant_id, employee_id).await
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        self.staff().insert_attendance(record).await
    }

    async fn close_attendance(
        &self,
        tenant_id: &str,
        record_id: &str,
        clock_out: DateTime<Utc>,
        hours_worked: f64,
    ) -> StoreResult<()> {
        self.staff().close_attendance(tenant_id, record_id, clock_out, hours_worked).await
    }

    async fn attendance_between(
        &self,
        tenant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        self.staff().attendance_between(tenant_id, from, to).await
    }
}
