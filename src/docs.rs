use crate::api::attendance::{MarkInResponse, MarkOutResponse};
use crate::api::report::{ByUserQuery, MonthQuery, RangeQuery, ReportCheck, SubmitReport};
use crate::attendance::reconciler::SweepReport;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::report::DailyReport;
use crate::report::aggregator::{DailyRow, EmployeeSummary, ReportText};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance and daily reporting

Employees mark in and out once per business day; hours worked and the
attendance status are derived at mark-out. A daily sweep marks employees
who never marked in as **Absent**.

### Key Features
- **Attendance**
  - Mark in / mark out, own history, full history for admins
- **Reports**
  - Daily roll-up, weekly and monthly per-employee summaries
  - Daily free-text work reports

### Security
Every endpoint requires a **JWT Bearer** access token.
Summaries are restricted to **HR** and **Admin**.
"#,
    ),
    paths(
        crate::api::attendance::mark_in,
        crate::api::attendance::mark_out,
        crate::api::attendance::all_attendance,
        crate::api::attendance::my_attendance,
        crate::api::attendance::run_sweep,

        crate::api::report::daily_report,
        crate::api::report::weekly_summary,
        crate::api::report::monthly_summary,
        crate::api::report::submit_report,
        crate::api::report::check_report,
        crate::api::report::reports_by_user
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            MarkInResponse,
            MarkOutResponse,
            SweepReport,
            Employee,
            DailyReport,
            DailyRow,
            EmployeeSummary,
            ReportText,
            SubmitReport,
            ReportCheck,
            RangeQuery,
            MonthQuery,
            ByUserQuery
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Attendance", description = "Mark-in, mark-out and attendance history"),
        (name = "Report", description = "Attendance summaries and daily work reports"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance/mark-in",
            "/api/attendance/mark-out",
            "/api/attendance/all",
            "/api/attendance/my",
            "/api/attendance/sweep",
            "/api/report/daily",
            "/api/report/weekly",
            "/api/report/monthly",
            "/api/report/submit",
            "/api/report/check",
            "/api/report/by-user",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
