use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures_util::TryStreamExt;
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};
use std::str::FromStr;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance, SessionClose};
use crate::model::employee::Employee;
use crate::model::report::DailyReport;
use crate::model::role::Role;
use crate::store::{AttendanceStore, EmployeeDirectory, ReportStore, StoreError};

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, name, email, date, login_time, logout_time,
    hours_worked, status, created_at, updated_at
"#;

/// MySQL backend. Relies on the UNIQUE (employee_id, date) keys declared in
/// `schema.sql`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    name: String,
    email: String,
    date: NaiveDate,
    login_time: Option<NaiveTime>,
    logout_time: Option<NaiveTime>,
    hours_worked: Option<Decimal>,
    status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        let status = row.status.as_deref().and_then(|label| {
            let status = AttendanceStatus::normalize(label);
            if status.is_none() {
                tracing::warn!(id = row.id, label, "Unrecognised attendance status");
            }
            status
        });

        AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            name: row.name,
            email: row.email,
            date: row.date,
            login_time: row.login_time,
            logout_time: row.logout_time,
            hours_worked: row.hours_worked,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    name: String,
    email: String,
    department: Option<String>,
    role: String,
    is_active: bool,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StoreError::Corrupt(format!("employee {} has role {:?}", row.id, row.role)))?;

        Ok(Employee {
            id: row.id,
            name: row.name,
            email: row.email,
            department: row.department.unwrap_or_default(),
            role,
            is_active: row.is_active,
        })
    }
}

#[derive(FromRow)]
struct ReportRow {
    id: u64,
    employee_id: u64,
    email: String,
    date: NaiveDate,
    content: String,
}

impl From<ReportRow> for DailyReport {
    fn from(row: ReportRow) -> Self {
        DailyReport {
            id: row.id,
            employee_id: row.employee_id,
            email: row.email,
            date: row.date,
            content: row.content,
        }
    }
}

/// Only unique-key violations are duplicates. Other integrity failures
/// (foreign key, NOT NULL) share SQLSTATE 23000 and stay backend errors.
fn duplicate_or(e: sqlx::Error, employee_id: u64, date: NaiveDate) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate { employee_id, date };
        }
    }
    StoreError::from(e)
}

impl MySqlStore {
    async fn attendance_by_id(&self, id: u64) -> Result<AttendanceRecord, StoreError> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn fetch_attendance(
        &self,
        sql: &str,
        binds: &[AttendanceBind],
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut query = sqlx::query_as::<_, AttendanceRow>(sql);
        for bind in binds {
            query = match bind {
                AttendanceBind::Id(v) => query.bind(*v),
                AttendanceBind::Date(v) => query.bind(*v),
            };
        }

        query
            .fetch(&self.pool)
            .map_ok(AttendanceRecord::from)
            .map_err(StoreError::from)
            .try_collect()
            .await
    }
}

// Helper enum for typed SQLx binding
enum AttendanceBind {
    Id(u64),
    Date(NaiveDate),
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        );
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AttendanceRecord::from))
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, name, email, date, login_time, hours_worked, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(record.date)
        .bind(record.login_time)
        .bind(record.hours_worked)
        .bind(record.status.map(|s| s.to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, record.employee_id, record.date))?;

        self.attendance_by_id(result.last_insert_id()).await
    }

    async fn close_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
        close: SessionClose,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET logout_time = ?, hours_worked = ?, status = ?
            WHERE employee_id = ?
            AND date = ?
            AND login_time IS NOT NULL
            AND logout_time IS NULL
            "#,
        )
        .bind(close.logout_time)
        .bind(close.hours_worked)
        .bind(close.status.to_string())
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_absent(&self, employee_id: u64, date: NaiveDate) -> Result<bool, StoreError> {
        // MySQL counts only changed rows as affected, so probe first.
        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM attendance
                WHERE employee_id = ? AND date = ? AND login_time IS NULL
            )
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        if exists == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE attendance
            SET status = ?, hours_worked = 0
            WHERE employee_id = ?
            AND date = ?
            AND login_time IS NULL
            "#,
        )
        .bind(AttendanceStatus::Absent.to_string())
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn list_all(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance ORDER BY id");
        self.fetch_attendance(&sql, &[]).await
    }

    async fn list_for_employee(
        &self,
        employee_id: u64,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? ORDER BY id"
        );
        self.fetch_attendance(&sql, &[AttendanceBind::Id(employee_id)])
            .await
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE date BETWEEN ? AND ? ORDER BY id"
        );
        self.fetch_attendance(&sql, &[AttendanceBind::Date(from), AttendanceBind::Date(to)])
            .await
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, name, email, department, role, is_active FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Employee::try_from).transpose()
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Employee>, StoreError> {
        sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, name, email, department, role, is_active FROM employees WHERE role = ? ORDER BY id",
        )
        .bind(role.to_string())
        .fetch(&self.pool)
        .map_err(StoreError::from)
        .and_then(|row| async move { Employee::try_from(row) })
        .try_collect()
        .await
    }

    async fn find_by_emails(&self, emails: &[String]) -> Result<Vec<Employee>, StoreError> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; emails.len()].join(", ");
        let sql = format!(
            "SELECT id, name, email, department, role, is_active FROM employees WHERE email IN ({placeholders})"
        );
        tracing::debug!(sql = %sql, count = emails.len(), "Looking up employees by email");

        let mut query = sqlx::query_as::<_, EmployeeRow>(&sql);
        for email in emails {
            query = query.bind(email);
        }

        query
            .fetch(&self.pool)
            .map_err(StoreError::from)
            .and_then(|row| async move { Employee::try_from(row) })
            .try_collect()
            .await
    }
}

#[async_trait]
impl ReportStore for MySqlStore {
    async fn submit(
        &self,
        employee_id: u64,
        date: NaiveDate,
        content: &str,
    ) -> Result<DailyReport, StoreError> {
        sqlx::query("INSERT INTO daily_reports (employee_id, date, content) VALUES (?, ?, ?)")
            .bind(employee_id)
            .bind(date)
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(|e| duplicate_or(e, employee_id, date))?;

        ReportStore::find(self, employee_id, date)
            .await?
            .ok_or_else(|| StoreError::Backend("report vanished after insert".to_string()))
    }

    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<DailyReport>, StoreError> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT r.id, r.employee_id, e.email, r.date, r.content
            FROM daily_reports r
            JOIN employees e ON e.id = r.employee_id
            WHERE r.employee_id = ? AND r.date = ?
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DailyReport::from))
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyReport>, StoreError> {
        sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT r.id, r.employee_id, e.email, r.date, r.content
            FROM daily_reports r
            JOIN employees e ON e.id = r.employee_id
            WHERE r.date BETWEEN ? AND ?
            ORDER BY r.id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch(&self.pool)
        .map_ok(DailyReport::from)
        .map_err(StoreError::from)
        .try_collect()
        .await
    }
}
