//! Pure joins of attendance rows, daily reports and identity attributes.
//!
//! Rows are grouped by employee email, the key shared by the attendance and
//! report collaborators. Output keeps the order in which each email first
//! appears in the attendance input.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::report::DailyReport;

pub const UNKNOWN: &str = "N/A";
pub const NO_REPORT: &str = "No report submitted";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportText {
    #[schema(example = "2025-07-14", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "name": "John Doe",
    "email": "john.doe@company.com",
    "department": "Sales",
    "role": "employee",
    "present": 18,
    "halfDay": 2,
    "absent": 1,
    "reports": [{ "date": "2025-07-14", "content": "Closed three follow-ups" }]
}))]
pub struct EmployeeSummary {
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    pub present: u32,
    pub half_day: u32,
    pub absent: u32,
    pub reports: Vec<ReportText>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyRow {
    pub name: String,
    pub email: String,
    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub mark_in: Option<chrono::NaiveTime>,
    #[schema(example = "17:00:00", value_type = Option<String>)]
    pub mark_out: Option<chrono::NaiveTime>,
    pub status: Option<AttendanceStatus>,
    #[schema(example = "8.00", value_type = Option<String>)]
    pub hours_worked: Option<Decimal>,
    pub report: String,
    pub department: String,
    pub role: String,
}

struct Identity<'a> {
    department: &'a str,
    role: String,
}

fn identities_by_email(identities: &[Employee]) -> HashMap<&str, Identity<'_>> {
    identities
        .iter()
        .map(|e| {
            let department = if e.department.is_empty() {
                UNKNOWN
            } else {
                e.department.as_str()
            };
            (
                e.email.as_str(),
                Identity {
                    department,
                    role: e.role.to_string(),
                },
            )
        })
        .collect()
}

/// Status a row counts towards. Rows without a status (sessions never
/// closed) count as absent.
fn tally_bucket(record: &AttendanceRecord) -> AttendanceStatus {
    record.status.unwrap_or(AttendanceStatus::Absent)
}

/// Per-employee present/half-day/absent tallies with the employee's reports
/// attached. Reports of employees with no attendance rows are dropped.
pub fn summarize(
    records: &[AttendanceRecord],
    reports: &[DailyReport],
    identities: &[Employee],
) -> Vec<EmployeeSummary> {
    let lookup = identities_by_email(identities);
    let mut order: Vec<&str> = Vec::new();
    let mut summaries: HashMap<&str, EmployeeSummary> = HashMap::new();

    for record in records {
        let email = record.email.as_str();
        let summary = summaries.entry(email).or_insert_with(|| {
            order.push(email);
            let identity = lookup.get(email);
            EmployeeSummary {
                name: record.name.clone(),
                email: record.email.clone(),
                department: identity.map_or(UNKNOWN, |i| i.department).to_string(),
                role: identity.map_or_else(|| UNKNOWN.to_string(), |i| i.role.clone()),
                present: 0,
                half_day: 0,
                absent: 0,
                reports: Vec::new(),
            }
        });

        match tally_bucket(record) {
            AttendanceStatus::Present => summary.present += 1,
            AttendanceStatus::HalfDay => summary.half_day += 1,
            AttendanceStatus::Absent => summary.absent += 1,
        }
    }

    for report in reports {
        if let Some(summary) = summaries.get_mut(report.email.as_str()) {
            summary.reports.push(ReportText {
                date: report.date,
                content: report.content.clone(),
            });
        }
    }

    order
        .into_iter()
        .filter_map(|email| summaries.remove(email))
        .collect()
}

/// One row per attendance record of a single day, with that day's report.
pub fn daily_rows(
    records: &[AttendanceRecord],
    reports: &[DailyReport],
    identities: &[Employee],
) -> Vec<DailyRow> {
    let lookup = identities_by_email(identities);
    let texts: HashMap<&str, &str> = reports
        .iter()
        .map(|r| (r.email.as_str(), r.content.as_str()))
        .collect();

    records
        .iter()
        .map(|record| {
            let identity = lookup.get(record.email.as_str());
            DailyRow {
                name: record.name.clone(),
                email: record.email.clone(),
                mark_in: record.login_time,
                mark_out: record.logout_time,
                status: record.status,
                hours_worked: record.hours_worked,
                report: texts
                    .get(record.email.as_str())
                    .copied()
                    .unwrap_or(NO_REPORT)
                    .to_string(),
                department: identity.map_or(UNKNOWN, |i| i.department).to_string(),
                role: identity.map_or_else(|| UNKNOWN.to_string(), |i| i.role.clone()),
            }
        })
        .collect()
}
