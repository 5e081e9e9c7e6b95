use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

/// Source of "today" and "now" for the attendance core.
///
/// Every date comparison goes through a clock bound to the business
/// timezone, never the host's local time.
pub trait Clock: Send + Sync + 'static {
    fn zoned_now(&self) -> DateTime<Tz>;

    fn zone(&self) -> Tz {
        self.zoned_now().timezone()
    }

    fn today(&self) -> NaiveDate {
        self.zoned_now().date_naive()
    }

    /// Business date and local time of day (whole seconds) read from one
    /// instant.
    fn local_stamp(&self) -> (NaiveDate, NaiveTime) {
        let now = self.zoned_now();
        (now.date_naive(), truncate_seconds(now.time()))
    }
}

fn truncate_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

#[derive(Debug, Clone, Copy)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for ZonedClock {
    fn zoned_now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    fn zone(&self) -> Tz {
        self.tz
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FixedClock, d, t};
    use super::*;
    use chrono::{Offset, TimeZone};

    #[test]
    fn zoned_clock_reads_time_in_its_zone() {
        let tz = chrono_tz::Asia::Kolkata;
        let clock = ZonedClock::new(tz);
        assert_eq!(clock.zone(), tz);

        let before = Utc::now().with_timezone(&tz).date_naive();
        let today = clock.today();
        let after = Utc::now().with_timezone(&tz).date_naive();
        assert!(today == before || today == after);

        let now = clock.zoned_now();
        assert_eq!(now.offset().fix().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn business_date_can_differ_from_utc_date() {
        // 20:00 UTC is already the next day in Kolkata (+05:30).
        let instant = Utc.with_ymd_and_hms(2025, 7, 14, 20, 0, 0).unwrap();
        let local = instant.with_timezone(&chrono_tz::Asia::Kolkata);
        assert_eq!(local.date_naive(), d("2025-07-15"));
        assert_eq!(local.time(), t("01:30:00"));
    }

    #[test]
    fn fixed_clock_drops_subsecond_precision() {
        let clock = FixedClock::at(chrono_tz::Asia::Kolkata, d("2025-07-14"), t("09:00:00"));
        let precise = NaiveTime::from_hms_milli_opt(9, 15, 30, 750).unwrap();
        clock.set_time(precise);
        assert_eq!(clock.local_stamp(), (d("2025-07-14"), t("09:15:30")));
        assert_eq!(clock.zone(), chrono_tz::Asia::Kolkata);
    }
}
