use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance, SessionClose};
use crate::model::role::Role;
use crate::store::{AttendanceStore, EmployeeDirectory, StoreError};

const SECONDS_PER_HOUR: i64 = 3600;

/// `>= 7.5` hours is a full day.
const PRESENT_THRESHOLD: Decimal = Decimal::from_parts(75, 0, 0, false, 1);
/// `>= 4.0` hours is a half day.
const HALF_DAY_THRESHOLD: Decimal = Decimal::from_parts(40, 0, 0, false, 1);

#[derive(Debug, Clone, PartialEq)]
pub enum MarkIn {
    Recorded(AttendanceRecord),
    AlreadyMarkedIn(AttendanceRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkOut {
    Recorded(AttendanceRecord),
    AlreadyMarkedOut(AttendanceRecord),
}

/// Status for a worked duration, first matching band wins.
pub fn status_for_hours(hours: Decimal) -> AttendanceStatus {
    if hours >= PRESENT_THRESHOLD {
        AttendanceStatus::Present
    } else if hours >= HALF_DAY_THRESHOLD {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Absent
    }
}

/// Hours between two times on the same local date, rounded half away from
/// zero to two places. `None` if `logout` precedes `login`.
pub fn hours_between(date: NaiveDate, login: NaiveTime, logout: NaiveTime) -> Option<Decimal> {
    let seconds = (date.and_time(logout) - date.and_time(login)).num_seconds();
    if seconds < 0 {
        return None;
    }

    let mut hours = (Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    hours.rescale(2);
    Some(hours)
}

/// Mark-in / mark-out state machine over one record per (employee, date).
///
/// `NoRecord -> LoggedIn -> Closed`. Repeated transitions are soft
/// conflicts reported through [`MarkIn`] / [`MarkOut`], not errors.
pub struct AttendanceEngine {
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
}

impl AttendanceEngine {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    pub async fn mark_in(&self, employee_id: u64) -> Result<MarkIn, AppError> {
        let (today, now) = self.clock.local_stamp();

        if let Some(existing) = self.store.find(employee_id, today).await? {
            return Ok(MarkIn::AlreadyMarkedIn(existing));
        }

        let employee = self
            .directory
            .find_by_id(employee_id)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

        let new = NewAttendance {
            employee_id,
            name: employee.name,
            email: employee.email,
            date: today,
            login_time: Some(now),
            hours_worked: None,
            status: None,
        };

        match self.store.insert(new).await {
            Ok(record) => {
                info!(employee_id, date = %today, login_time = %now, "Marked in");
                Ok(MarkIn::Recorded(record))
            }
            // Lost a race with a concurrent mark-in for the same day.
            Err(StoreError::Duplicate { .. }) => {
                let existing = self.store.find(employee_id, today).await?.ok_or_else(|| {
                    StoreError::Backend("duplicate attendance row not readable".to_string())
                })?;
                Ok(MarkIn::AlreadyMarkedIn(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn mark_out(&self, employee_id: u64) -> Result<MarkOut, AppError> {
        let (today, now) = self.clock.local_stamp();

        let record = self
            .store
            .find(employee_id, today)
            .await?
            .ok_or_else(|| AppError::NotFound("No attendance record found for today".to_string()))?;

        if record.is_closed() {
            return Ok(MarkOut::AlreadyMarkedOut(record));
        }

        let login = record.login_time.ok_or_else(|| {
            AppError::NotFound("No open session found for today".to_string())
        })?;

        let hours = hours_between(today, login, now).ok_or_else(|| {
            warn!(
                employee_id,
                date = %today,
                login_time = %login,
                logout_time = %now,
                "Logout precedes login, leaving session open for review"
            );
            AppError::InvalidSession("Logout time is earlier than login time".to_string())
        })?;

        let close = SessionClose {
            logout_time: now,
            hours_worked: hours,
            status: status_for_hours(hours),
        };

        let applied = self.store.close_session(employee_id, today, close).await?;

        let record = self.store.find(employee_id, today).await?.ok_or_else(|| {
            StoreError::Backend("attendance row disappeared during mark-out".to_string())
        })?;

        if !applied {
            return Ok(MarkOut::AlreadyMarkedOut(record));
        }

        info!(
            employee_id,
            date = %today,
            hours_worked = %hours,
            status = %close.status,
            "Marked out"
        );
        Ok(MarkOut::Recorded(record))
    }

    /// Every non-admin record, newest date first.
    pub async fn list_all(&self) -> Result<Vec<AttendanceRecord>, AppError> {
        let admins: HashSet<u64> = self
            .directory
            .list_by_role(Role::Admin)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();

        let mut records: Vec<_> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|r| !admins.contains(&r.employee_id))
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    /// The caller's own records, oldest date first.
    pub async fn list_mine(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut records = self.store.list_for_employee(employee_id).await?;
        records.sort_by_key(|r| r.date);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::{FixedClock, d, t};
    use crate::model::employee::Employee;
    use crate::store::memory::InMemoryStore;
    use crate::store::memory::testing::ScriptedStore;
    use rust_decimal_macros::dec;

    fn employee(id: u64, role: Role) -> Employee {
        Employee {
            id,
            name: format!("Employee {id}"),
            email: format!("e{id}@corp.test"),
            department: "Sales".into(),
            role,
            is_active: true,
        }
    }

    fn setup(date: &str, time: &str) -> (AttendanceEngine, Arc<InMemoryStore>, Arc<FixedClock>) {
        let store = Arc::new(InMemoryStore::with_employees(vec![
            employee(1, Role::Employee),
            employee(2, Role::Employee),
            employee(9, Role::Admin),
        ]));
        let clock = Arc::new(FixedClock::at(chrono_tz::Asia::Kolkata, d(date), t(time)));
        let engine = AttendanceEngine::new(store.clone(), store.clone(), clock.clone());
        (engine, store, clock)
    }

    #[test]
    fn status_bands_are_inclusive_on_the_high_side() {
        assert_eq!(status_for_hours(dec!(7.5)), AttendanceStatus::Present);
        assert_eq!(status_for_hours(dec!(7.49)), AttendanceStatus::HalfDay);
        assert_eq!(status_for_hours(dec!(4.0)), AttendanceStatus::HalfDay);
        assert_eq!(status_for_hours(dec!(3.99)), AttendanceStatus::Absent);
        assert_eq!(status_for_hours(dec!(0)), AttendanceStatus::Absent);
    }

    #[test]
    fn hours_are_rounded_to_two_places() {
        let day = d("2025-07-14");
        assert_eq!(hours_between(day, t("09:00:00"), t("17:00:00")).unwrap().to_string(), "8.00");
        assert_eq!(hours_between(day, t("09:00:00"), t("13:30:00")).unwrap(), dec!(4.50));
        // 20 minutes = 0.3333.. hours
        assert_eq!(hours_between(day, t("09:00:00"), t("09:20:00")).unwrap(), dec!(0.33));
        // 27 seconds = 0.0075 hours, midpoint rounds away from zero
        assert_eq!(hours_between(day, t("09:00:00"), t("09:00:27")).unwrap(), dec!(0.01));
        assert!(hours_between(day, t("17:00:00"), t("09:00:00")).is_none());
    }

    #[actix_web::test]
    async fn mark_in_losing_an_insert_race_returns_the_winning_row() {
        let store = Arc::new(InMemoryStore::with_employees(vec![employee(1, Role::Employee)]));
        let racing = Arc::new(ScriptedStore::new(store.clone()).competing_mark_in(1, t("08:59:30")));
        let clock = Arc::new(FixedClock::at(chrono_tz::Asia::Kolkata, d("2025-07-14"), t("09:00:00")));
        let engine = AttendanceEngine::new(racing, store.clone(), clock);

        let MarkIn::AlreadyMarkedIn(record) = engine.mark_in(1).await.unwrap() else {
            panic!("a lost insert race must not record a second login");
        };
        assert_eq!(record.login_time, Some(t("08:59:30")));
        assert_eq!(store.list_for_employee(1).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn repeated_mark_in_keeps_first_login_time() {
        let (engine, store, clock) = setup("2025-07-14", "09:00:00");

        let first = engine.mark_in(1).await.unwrap();
        assert!(matches!(first, MarkIn::Recorded(ref r) if r.login_time == Some(t("09:00:00"))));

        clock.set_time(t("09:45:00"));
        for _ in 0..3 {
            match engine.mark_in(1).await.unwrap() {
                MarkIn::AlreadyMarkedIn(r) => assert_eq!(r.login_time, Some(t("09:00:00"))),
                other => panic!("expected soft conflict, got {other:?}"),
            }
        }

        let rows = store.list_for_employee(1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, d("2025-07-14"));
        assert_eq!(rows[0].status, None);
    }

    #[actix_web::test]
    async fn mark_in_rejects_unknown_or_inactive_employee() {
        let (engine, store, _clock) = setup("2025-07-14", "09:00:00");
        assert!(matches!(engine.mark_in(42).await, Err(AppError::NotFound(_))));

        let mut inactive = employee(3, Role::Employee);
        inactive.is_active = false;
        store.upsert_employee(inactive).unwrap();
        assert!(matches!(engine.mark_in(3).await, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn mark_out_without_mark_in_is_not_found() {
        let (engine, _store, _clock) = setup("2025-07-14", "17:00:00");
        assert!(matches!(engine.mark_out(1).await, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn full_day_is_present() {
        let (engine, _store, clock) = setup("2025-07-14", "09:00:00");
        engine.mark_in(1).await.unwrap();

        clock.set_time(t("17:00:00"));
        let MarkOut::Recorded(record) = engine.mark_out(1).await.unwrap() else {
            panic!("expected first mark-out to be recorded");
        };
        assert_eq!(record.logout_time, Some(t("17:00:00")));
        assert_eq!(record.hours_worked.unwrap().to_string(), "8.00");
        assert_eq!(record.status, Some(AttendanceStatus::Present));
    }

    #[actix_web::test]
    async fn short_day_is_half_day() {
        let (engine, _store, clock) = setup("2025-07-14", "09:00:00");
        engine.mark_in(1).await.unwrap();

        clock.set_time(t("13:30:00"));
        let MarkOut::Recorded(record) = engine.mark_out(1).await.unwrap() else {
            panic!("expected first mark-out to be recorded");
        };
        assert_eq!(record.hours_worked, Some(dec!(4.50)));
        assert_eq!(record.status, Some(AttendanceStatus::HalfDay));
    }

    #[actix_web::test]
    async fn second_mark_out_changes_nothing() {
        let (engine, _store, clock) = setup("2025-07-14", "09:00:00");
        engine.mark_in(1).await.unwrap();
        clock.set_time(t("12:00:00"));
        let MarkOut::Recorded(first) = engine.mark_out(1).await.unwrap() else {
            panic!("expected first mark-out to be recorded");
        };
        assert_eq!(first.status, Some(AttendanceStatus::Absent));

        clock.set_time(t("18:00:00"));
        let MarkOut::AlreadyMarkedOut(second) = engine.mark_out(1).await.unwrap() else {
            panic!("expected soft conflict");
        };
        assert_eq!(second.logout_time, first.logout_time);
        assert_eq!(second.hours_worked, first.hours_worked);
        assert_eq!(second.status, first.status);
    }

    #[actix_web::test]
    async fn logout_before_login_is_rejected_and_session_stays_open() {
        let (engine, store, clock) = setup("2025-07-14", "09:00:00");
        engine.mark_in(1).await.unwrap();

        clock.set_time(t("08:00:00"));
        assert!(matches!(engine.mark_out(1).await, Err(AppError::InvalidSession(_))));

        let row = store.find(1, d("2025-07-14")).await.unwrap().unwrap();
        assert!(row.is_open());
        assert_eq!(row.hours_worked, None);
    }

    #[actix_web::test]
    async fn listings_are_sorted_and_exclude_admins() {
        let (engine, _store, clock) = setup("2025-07-14", "09:00:00");
        engine.mark_in(1).await.unwrap();
        engine.mark_in(9).await.unwrap();
        clock.set(d("2025-07-15"), t("09:00:00"));
        engine.mark_in(1).await.unwrap();
        engine.mark_in(2).await.unwrap();
        clock.set(d("2025-07-13"), t("09:00:00"));
        engine.mark_in(1).await.unwrap();

        let all = engine.list_all().await.unwrap();
        assert!(all.iter().all(|r| r.employee_id != 9));
        let dates: Vec<_> = all.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![d("2025-07-15"), d("2025-07-15"), d("2025-07-14"), d("2025-07-13")]
        );

        let mine: Vec<_> = engine
            .list_mine(1)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(mine, vec![d("2025-07-13"), d("2025-07-14"), d("2025-07-15")]);
    }
}
