use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance, SessionClose};
use crate::model::employee::Employee;
use crate::model::report::DailyReport;
use crate::model::role::Role;
use crate::store::{AttendanceStore, EmployeeDirectory, ReportStore, StoreError};

/// Process-local backend used when no database is configured and in tests.
/// Rows keep insertion order, like an auto-increment table scanned by id.
#[derive(Default)]
pub struct InMemoryStore {
    employees: RwLock<Vec<Employee>>,
    attendance: RwLock<Vec<AttendanceRecord>>,
    reports: RwLock<Vec<DailyReport>>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

impl InMemoryStore {
    pub fn with_employees(employees: Vec<Employee>) -> Self {
        Self {
            employees: RwLock::new(employees),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn upsert_employee(&self, employee: Employee) -> Result<(), StoreError> {
        let mut employees = self.employees.write().map_err(poisoned)?;
        match employees.iter_mut().find(|e| e.id == employee.id) {
            Some(existing) => *existing = employee,
            None => employees.push(employee),
        }
        Ok(())
    }

    fn email_of(&self, employee_id: u64) -> Result<String, StoreError> {
        let employees = self.employees.read().map_err(poisoned)?;
        employees
            .iter()
            .find(|e| e.id == employee_id)
            .map(|e| e.email.clone())
            .ok_or_else(|| StoreError::Corrupt(format!("unknown employee {employee_id}")))
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let rows = self.attendance.read().map_err(poisoned)?;
        Ok(rows
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let mut rows = self.attendance.write().map_err(poisoned)?;
        if rows
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(StoreError::Duplicate {
                employee_id: record.employee_id,
                date: record.date,
            });
        }

        let now = Utc::now();
        let row = AttendanceRecord {
            id: rows.len() as u64 + 1,
            employee_id: record.employee_id,
            name: record.name,
            email: record.email,
            date: record.date,
            login_time: record.login_time,
            logout_time: None,
            hours_worked: record.hours_worked,
            status: record.status,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn close_session(
        &self,
        employee_id: u64,
        date: NaiveDate,
        close: SessionClose,
    ) -> Result<bool, StoreError> {
        let mut rows = self.attendance.write().map_err(poisoned)?;
        let Some(row) = rows.iter_mut().find(|r| {
            r.employee_id == employee_id
                && r.date == date
                && r.login_time.is_some()
                && r.logout_time.is_none()
        }) else {
            return Ok(false);
        };

        row.logout_time = Some(close.logout_time);
        row.hours_worked = Some(close.hours_worked);
        row.status = Some(close.status);
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn mark_absent(&self, employee_id: u64, date: NaiveDate) -> Result<bool, StoreError> {
        let mut rows = self.attendance.write().map_err(poisoned)?;
        let Some(row) = rows.iter_mut().find(|r| {
            r.employee_id == employee_id && r.date == date && r.login_time.is_none()
        }) else {
            return Ok(false);
        };

        row.status = Some(AttendanceStatus::Absent);
        row.hours_worked = Some(Decimal::ZERO);
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_all(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.attendance.read().map_err(poisoned)?.clone())
    }

    async fn list_for_employee(
        &self,
        employee_id: u64,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = self.attendance.read().map_err(poisoned)?;
        Ok(rows
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = self.attendance.read().map_err(poisoned)?;
        Ok(rows
            .iter()
            .filter(|r| r.date >= from && r.date <= to)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        let employees = self.employees.read().map_err(poisoned)?;
        Ok(employees.iter().find(|e| e.id == id).cloned())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Employee>, StoreError> {
        let employees = self.employees.read().map_err(poisoned)?;
        Ok(employees.iter().filter(|e| e.role == role).cloned().collect())
    }

    async fn find_by_emails(&self, emails: &[String]) -> Result<Vec<Employee>, StoreError> {
        let employees = self.employees.read().map_err(poisoned)?;
        Ok(employees
            .iter()
            .filter(|e| emails.contains(&e.email))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReportStore for InMemoryStore {
    async fn submit(
        &self,
        employee_id: u64,
        date: NaiveDate,
        content: &str,
    ) -> Result<DailyReport, StoreError> {
        let email = self.email_of(employee_id)?;
        let mut reports = self.reports.write().map_err(poisoned)?;
        if reports
            .iter()
            .any(|r| r.employee_id == employee_id && r.date == date)
        {
            return Err(StoreError::Duplicate { employee_id, date });
        }

        let report = DailyReport {
            id: reports.len() as u64 + 1,
            employee_id,
            email,
            date,
            content: content.to_string(),
        };
        reports.push(report.clone());
        Ok(report)
    }

    async fn find(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<DailyReport>, StoreError> {
        let reports = self.reports.read().map_err(poisoned)?;
        Ok(reports
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyReport>, StoreError> {
        let reports = self.reports.read().map_err(poisoned)?;
        Ok(reports
            .iter()
            .filter(|r| r.date >= from && r.date <= to)
            .cloned()
            .collect())
    }
}
