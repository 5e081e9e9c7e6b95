use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::AppError;

/// Longest range a weekly/arbitrary-range query may cover.
pub const MAX_RANGE_DAYS: u64 = 366;

/// Date window of a report query. Both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Day(NaiveDate),
    Range { from: NaiveDate, to: NaiveDate },
    Month { year: i32, month: u32 },
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date {value:?}, expected YYYY-MM-DD")))
}

impl ReportPeriod {
    pub fn range(from: &str, to: &str) -> Result<Self, AppError> {
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        if from > to {
            return Err(AppError::Validation(
                "from must not be after to".to_string(),
            ));
        }
        let span = to.signed_duration_since(from).num_days() as u64 + 1;
        if span > MAX_RANGE_DAYS {
            return Err(AppError::Validation(format!(
                "Range covers {span} days, at most {MAX_RANGE_DAYS} allowed"
            )));
        }
        Ok(ReportPeriod::Range { from, to })
    }

    /// Parses a `YYYY-MM` month.
    pub fn month(value: &str) -> Result<Self, AppError> {
        let value = value.trim();
        let invalid = || AppError::Validation(format!("Invalid month {value:?}, expected YYYY-MM"));
        if value.len() != 7 {
            return Err(invalid());
        }
        let first = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
            .map_err(|_| invalid())?;
        Ok(ReportPeriod::Month {
            year: first.year(),
            month: first.month(),
        })
    }

    /// `filter_type` is one of `daily` (`YYYY-MM-DD`), `weekly`
    /// (`from,to`) or `monthly` (`YYYY-MM`).
    pub fn from_filter(filter_type: &str, filter_value: &str) -> Result<Self, AppError> {
        match filter_type {
            "daily" => Ok(ReportPeriod::Day(parse_date(filter_value)?)),
            "weekly" => {
                let (from, to) = filter_value.split_once(',').ok_or_else(|| {
                    AppError::Validation("weekly filter expects \"from,to\"".to_string())
                })?;
                Self::range(from, to)
            }
            "monthly" => Self::month(filter_value),
            other => Err(AppError::Validation(format!(
                "Unknown filterType {other:?}, expected daily, weekly or monthly"
            ))),
        }
    }

    /// Inclusive first and last date.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            ReportPeriod::Day(day) => (day, day),
            ReportPeriod::Range { from, to } => (from, to),
            ReportPeriod::Month { year, month } => {
                // Validated on construction, so the first of the month exists.
                let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default();
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.checked_sub_days(Days::new(1)))
                    .unwrap_or(first);
                (first, last)
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let (first, last) = self.bounds();
        date >= first && date <= last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::d;

    #[test]
    fn month_bounds_cover_whole_month() {
        let july = ReportPeriod::month("2025-07").unwrap();
        assert_eq!(july.bounds(), (d("2025-07-01"), d("2025-07-31")));

        let feb = ReportPeriod::month("2024-02").unwrap();
        assert_eq!(feb.bounds(), (d("2024-02-01"), d("2024-02-29")));

        let dec = ReportPeriod::month("2025-12").unwrap();
        assert_eq!(dec.bounds(), (d("2025-12-01"), d("2025-12-31")));
    }

    #[test]
    fn malformed_months_are_rejected() {
        for bad in ["2025-13", "2025-7", "July", "2025/07", "2025-07-01", ""] {
            assert!(
                matches!(ReportPeriod::month(bad), Err(AppError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn range_must_be_ordered_and_bounded() {
        assert!(ReportPeriod::range("2025-07-07", "2025-07-13").is_ok());
        assert!(ReportPeriod::range("2025-07-13", "2025-07-13").is_ok());
        assert!(matches!(
            ReportPeriod::range("2025-07-13", "2025-07-07"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ReportPeriod::range("2024-01-01", "2025-07-01"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ReportPeriod::range("yesterday", "2025-07-01"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn filters_map_onto_periods() {
        assert_eq!(
            ReportPeriod::from_filter("daily", "2025-07-14").unwrap(),
            ReportPeriod::Day(d("2025-07-14"))
        );
        assert_eq!(
            ReportPeriod::from_filter("weekly", "2025-07-07,2025-07-13").unwrap(),
            ReportPeriod::Range {
                from: d("2025-07-07"),
                to: d("2025-07-13")
            }
        );
        assert_eq!(
            ReportPeriod::from_filter("monthly", "2025-07").unwrap(),
            ReportPeriod::Month { year: 2025, month: 7 }
        );
        assert!(ReportPeriod::from_filter("weekly", "2025-07-07").is_err());
        assert!(ReportPeriod::from_filter("yearly", "2025").is_err());
    }

    #[test]
    fn contains_respects_inclusive_bounds() {
        let week = ReportPeriod::range("2025-07-07", "2025-07-13").unwrap();
        assert!(week.contains(d("2025-07-07")));
        assert!(week.contains(d("2025-07-13")));
        assert!(!week.contains(d("2025-07-14")));
    }
}
