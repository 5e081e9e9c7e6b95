//! Persistence seams for the attendance core.
//!
//! Uniqueness of (employee, date) for attendance and daily reports is the
//! store's job: a second insert for the same key must fail with
//! [`StoreError::Duplicate`], which callers treat as a soft conflict.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::attendance::{AttendanceRecord, NewAttendance, SessionClose};
use crate::model::employee::Employee;
use crate::model::report::DailyReport;
use crate::model::role::Role;

pub mod memory;
pub mod mysql;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A row with the same unique key already exists.
    #[error("duplicate entry for employee {employee_id} on {date}")]
    Duplicate { employee_id: u64, date: NaiveDate },

    /// A stored value could not be mapped onto the domain model.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync + 'static {
    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Returns `Err(StoreError::Duplicate)` if a record for the same
    /// (employee, date) exists.
    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    /// Writes logout fields only if the session is still open.
    /// Returns `false` when nothing was updated.
    async fn close_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
        close: SessionClose,
    ) -> Result<bool, StoreError>;

    /// Sets status Absent and zero hours on a record that has no login time.
    /// Returns `false` when no such record exists.
    async fn mark_absent(&self, employee_id: u64, date: NaiveDate) -> Result<bool, StoreError>;

    async fn list_all(&self) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn list_for_employee(&self, employee_id: u64)
    -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Records with `from <= date <= to`.
    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;
}

/// Read-only identity lookup.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync + 'static {
    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError>;

    async fn list_by_role(&self, role: Role) -> Result<Vec<Employee>, StoreError>;

    async fn find_by_emails(&self, emails: &[String]) -> Result<Vec<Employee>, StoreError>;
}

#[async_trait]
pub trait ReportStore: Send + Sync + 'static {
    /// Returns `Err(StoreError::Duplicate)` if the employee already filed a
    /// report for `date`.
    async fn submit(
        &self,
        employee_id: u64,
        date: NaiveDate,
        content: &str,
    ) -> Result<DailyReport, StoreError>;

    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<DailyReport>, StoreError>;

    /// Reports with `from <= date <= to`, joined with the author's email.
    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyReport>, StoreError>;
}
