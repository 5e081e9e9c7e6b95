use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::AppError;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::model::report::DailyReport;
use crate::report::aggregator::{self, DailyRow, EmployeeSummary};
use crate::report::period::ReportPeriod;
use crate::store::{AttendanceStore, EmployeeDirectory, ReportStore, StoreError};

/// Read side of attendance plus daily report submission. Never mutates
/// attendance.
pub struct ReportService {
    attendance: Arc<dyn AttendanceStore>,
    reports: Arc<dyn ReportStore>,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(
        attendance: Arc<dyn AttendanceStore>,
        reports: Arc<dyn ReportStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            attendance,
            reports,
            directory,
            clock,
        }
    }

    async fn identities_for(&self, records: &[AttendanceRecord]) -> Result<Vec<Employee>, StoreError> {
        let emails: Vec<String> = records
            .iter()
            .map(|r| r.email.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.directory.find_by_emails(&emails).await
    }

    /// Today's attendance joined with today's reports.
    pub async fn daily(&self) -> Result<Vec<DailyRow>, AppError> {
        let today = self.clock.today();
        let records = self.attendance.list_between(today, today).await?;
        let reports = self.reports.list_between(today, today).await?;
        let identities = self.identities_for(&records).await?;

        debug!(date = %today, rows = records.len(), "Building daily report");
        Ok(aggregator::daily_rows(&records, &reports, &identities))
    }

    /// Per-employee tallies over `period`, optionally limited to one
    /// department (case-insensitive, matched against the directory).
    pub async fn summary(
        &self,
        period: ReportPeriod,
        department: Option<&str>,
    ) -> Result<Vec<EmployeeSummary>, AppError> {
        let (from, to) = period.bounds();
        let mut records = self.attendance.list_between(from, to).await?;
        let reports = self.reports.list_between(from, to).await?;
        let identities = self.identities_for(&records).await?;

        if let Some(department) = department.map(str::trim).filter(|d| !d.is_empty()) {
            records.retain(|r| {
                identities
                    .iter()
                    .any(|e| e.email == r.email && e.department.eq_ignore_ascii_case(department))
            });
        }

        debug!(%from, %to, rows = records.len(), reports = reports.len(), "Building summary");
        Ok(aggregator::summarize(&records, &reports, &identities))
    }

    pub async fn submit(&self, employee_id: u64, content: &str) -> Result<DailyReport, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Report is required".to_string()));
        }

        if self.directory.find_by_id(employee_id).await?.is_none() {
            return Err(AppError::NotFound("Employee not found".to_string()));
        }

        let today = self.clock.today();
        match self.reports.submit(employee_id, today, content).await {
            Ok(report) => {
                info!(employee_id, date = %today, "Daily report submitted");
                Ok(report)
            }
            Err(StoreError::Duplicate { .. }) => {
                Err(AppError::Conflict("Report already submitted".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The caller's report for today, if any.
    pub async fn todays_report(&self, employee_id: u64) -> Result<Option<DailyReport>, AppError> {
        let today = self.clock.today();
        Ok(self.reports.find(employee_id, today).await?)
    }

    pub async fn by_user(
        &self,
        email: &str,
        period: ReportPeriod,
    ) -> Result<Vec<DailyReport>, AppError> {
        let (from, to) = period.bounds();
        let mut reports = self.reports.list_between(from, to).await?;
        reports.retain(|r| period.contains(r.date) && r.email.eq_ignore_ascii_case(email.trim()));
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::engine::AttendanceEngine;
    use crate::attendance::reconciler::AbsenceReconciler;
    use crate::clock::testing::{FixedClock, d, t};
    use crate::model::role::Role;
    use crate::store::memory::InMemoryStore;

    fn staff(id: u64, department: &str) -> Employee {
        Employee {
            id,
            name: format!("Staff {id}"),
            email: format!("s{id}@corp.test"),
            department: department.to_string(),
            role: Role::Employee,
            is_active: true,
        }
    }

    struct Harness {
        engine: AttendanceEngine,
        reconciler: AbsenceReconciler,
        reports: ReportService,
        clock: Arc<FixedClock>,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::with_employees(vec![
            staff(1, "Sales"),
            staff(2, "IT"),
        ]));
        let clock = Arc::new(FixedClock::at(chrono_tz::Asia::Kolkata, d("2025-06-30"), t("09:00:00")));
        Harness {
            engine: AttendanceEngine::new(store.clone(), store.clone(), clock.clone()),
            reconciler: AbsenceReconciler::new(store.clone(), store.clone()),
            reports: ReportService::new(store.clone(), store.clone(), store.clone(), clock.clone()),
            clock,
        }
    }

    /// Marks in at 09:00 on `date` and out at `logout`.
    async fn work(h: &Harness, employee_id: u64, date: &str, logout: &str) {
        h.clock.set(d(date), t("09:00:00"));
        h.engine.mark_in(employee_id).await.unwrap();
        h.clock.set_time(t(logout));
        h.engine.mark_out(employee_id).await.unwrap();
    }

    #[actix_web::test]
    async fn monthly_summary_only_counts_that_month() {
        let h = harness();
        work(&h, 1, "2025-06-30", "17:00:00").await;
        work(&h, 1, "2025-07-01", "17:00:00").await;
        work(&h, 1, "2025-07-02", "13:30:00").await;
        work(&h, 2, "2025-07-02", "17:30:00").await;
        h.reconciler.run_sweep(d("2025-07-03")).await.unwrap();
        work(&h, 1, "2025-08-01", "17:00:00").await;

        let summary = h
            .reports
            .summary(ReportPeriod::month("2025-07").unwrap(), None)
            .await
            .unwrap();

        assert_eq!(summary.len(), 2);
        let s1 = &summary[0];
        assert_eq!(s1.email, "s1@corp.test");
        assert_eq!((s1.present, s1.half_day, s1.absent), (1, 1, 1));
        let s2 = &summary[1];
        assert_eq!((s2.present, s2.half_day, s2.absent), (1, 0, 1));

        let (from, to) = ReportPeriod::month("2025-07").unwrap().bounds();
        let dates: Vec<_> = h
            .engine
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.date >= from && r.date <= to)
            .map(|r| r.date.to_string())
            .collect();
        assert_eq!(dates.len(), 5);
        assert!(dates.iter().all(|date| date.starts_with("2025-07")));
    }

    #[actix_web::test]
    async fn department_filter_uses_directory() {
        let h = harness();
        work(&h, 1, "2025-07-07", "17:00:00").await;
        work(&h, 2, "2025-07-08", "17:00:00").await;

        let week = ReportPeriod::range("2025-07-07", "2025-07-13").unwrap();
        let it = h.reports.summary(week, Some("it")).await.unwrap();
        assert_eq!(it.len(), 1);
        assert_eq!(it[0].email, "s2@corp.test");
        assert_eq!(it[0].department, "IT");

        let all = h.reports.summary(week, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[actix_web::test]
    async fn one_report_per_day() {
        let h = harness();
        assert!(matches!(
            h.reports.submit(1, "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(h.reports.todays_report(1).await.unwrap().is_none());

        h.reports.submit(1, "Called five leads").await.unwrap();
        assert!(matches!(
            h.reports.submit(1, "again").await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(
            h.reports.todays_report(1).await.unwrap().unwrap().content,
            "Called five leads"
        );
        assert!(matches!(
            h.reports.submit(77, "who am I").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn daily_view_joins_today_only() {
        let h = harness();
        work(&h, 1, "2025-07-13", "17:00:00").await;
        work(&h, 1, "2025-07-14", "17:00:00").await;
        h.reports.submit(1, "wrapped up Q2 numbers").await.unwrap();

        let rows = h.reports.daily().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].report, "wrapped up Q2 numbers");
        assert_eq!(rows[0].department, "Sales");

        let mine = h
            .reports
            .by_user("S1@corp.test", ReportPeriod::from_filter("monthly", "2025-07").unwrap())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].date, d("2025-07-14"));
    }
}
