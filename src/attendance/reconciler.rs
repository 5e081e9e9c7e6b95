use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::clock::Clock;
use crate::model::attendance::{AttendanceStatus, NewAttendance};
use crate::model::employee::Employee;
use crate::model::role::Role;
use crate::store::{AttendanceStore, EmployeeDirectory, StoreError};

/// Outcome of one sweep. Per-employee failures are counted, not raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    #[schema(example = "2025-07-14", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub examined: usize,
    /// Absent rows created for employees with no record.
    pub created: usize,
    /// Existing rows without a login that were set to Absent.
    pub corrected: usize,
    pub untouched: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Created,
    Corrected,
    Untouched,
}

/// Closes out a day for every `employee`-role identity that never marked in.
///
/// Records that have a login time are never touched, including sessions
/// still open at sweep time.
pub struct AbsenceReconciler {
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn EmployeeDirectory>,
}

impl AbsenceReconciler {
    pub fn new(store: Arc<dyn AttendanceStore>, directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { store, directory }
    }

    /// Runs the sweep for `date`. Only a failure to list employees is fatal.
    pub async fn run_sweep(&self, date: NaiveDate) -> Result<SweepReport, StoreError> {
        let employees = self.directory.list_by_role(Role::Employee).await?;
        let mut report = SweepReport {
            date,
            ..SweepReport::default()
        };

        for employee in &employees {
            report.examined += 1;
            match self.reconcile(employee, date).await {
                Ok(Step::Created) => {
                    report.created += 1;
                    info!(employee_id = employee.id, %date, "Marked absent");
                }
                Ok(Step::Corrected) => {
                    report.corrected += 1;
                    info!(employee_id = employee.id, %date, "Marked absent (no login)");
                }
                Ok(Step::Untouched) => report.untouched += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(error = %e, employee_id = employee.id, %date, "Absence sweep step failed");
                }
            }
        }

        info!(
            %date,
            examined = report.examined,
            created = report.created,
            corrected = report.corrected,
            untouched = report.untouched,
            failed = report.failed,
            "Absence sweep complete"
        );
        Ok(report)
    }

    async fn reconcile(&self, employee: &Employee, date: NaiveDate) -> Result<Step, StoreError> {
        match self.store.find(employee.id, date).await? {
            None => {
                let absent = NewAttendance {
                    employee_id: employee.id,
                    name: employee.name.clone(),
                    email: employee.email.clone(),
                    date,
                    login_time: None,
                    hours_worked: Some(Decimal::ZERO),
                    status: Some(AttendanceStatus::Absent),
                };
                match self.store.insert(absent).await {
                    Ok(_) => Ok(Step::Created),
                    // Marked in between our read and insert.
                    Err(StoreError::Duplicate { .. }) => Ok(Step::Untouched),
                    Err(e) => Err(e),
                }
            }
            Some(record) if record.login_time.is_none() => {
                let settled = record.status == Some(AttendanceStatus::Absent)
                    && record.hours_worked.is_some_and(|h| h.is_zero());
                if settled {
                    return Ok(Step::Untouched);
                }
                if self.store.mark_absent(employee.id, date).await? {
                    Ok(Step::Corrected)
                } else {
                    Ok(Step::Untouched)
                }
            }
            Some(record) => {
                if record.is_open() {
                    debug!(employee_id = employee.id, %date, "Session still open at sweep time");
                }
                Ok(Step::Untouched)
            }
        }
    }
}

/// Next instant at or after which local wall time reads `at`, strictly
/// after `now`. Skips forward a day when `at` falls in a DST gap.
pub fn next_run_after(now: DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    loop {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            if candidate > now {
                return candidate;
            }
        }
        date = match date.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => return now,
        };
    }
}

/// Spawns the daily sweep on the actix runtime. Each run uses the business
/// date the timer fired on.
pub fn spawn_daily_sweep(reconciler: Arc<AbsenceReconciler>, clock: Arc<dyn Clock>, at: NaiveTime) {
    actix_web::rt::spawn(async move {
        info!(at = %at, zone = %clock.zone(), "Absence sweep scheduled");
        loop {
            let now = clock.zoned_now();
            let next = next_run_after(now, at);
            let wait = (next - now).to_std().unwrap_or(Duration::from_secs(60));
            debug!(next = %next, wait_secs = wait.as_secs(), "Waiting for next absence sweep");
            actix_web::rt::time::sleep(wait).await;

            let today = clock.today();
            if let Err(e) = reconciler.run_sweep(today).await {
                warn!(error = %e, date = %today, "Absence sweep aborted");
            }
        }
    });
}
