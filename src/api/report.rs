use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::report::DailyReport;
use crate::report::aggregator::{DailyRow, EmployeeSummary};
use crate::report::period::ReportPeriod;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SubmitReport {
    #[schema(example = "Followed up with 4 leads, prepared demo deck")]
    pub content: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportCheck {
    pub has_submitted_report: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DailyReport>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RangeQuery {
    /// First day, YYYY-MM-DD
    #[schema(example = "2025-07-07")]
    pub from: Option<String>,
    /// Last day (inclusive), YYYY-MM-DD
    #[schema(example = "2025-07-13")]
    pub to: Option<String>,
    /// Only employees of this department
    #[schema(example = "Sales")]
    pub department: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Month, YYYY-MM
    #[schema(example = "2025-07")]
    pub month: Option<String>,
    /// Only employees of this department
    #[schema(example = "Sales")]
    pub department: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct ByUserQuery {
    #[schema(example = "john.doe@company.com")]
    pub email: Option<String>,
    /// daily, weekly or monthly
    #[schema(example = "weekly")]
    pub filter_type: Option<String>,
    /// YYYY-MM-DD, "from,to" or YYYY-MM depending on filterType
    #[schema(example = "2025-07-07,2025-07-13")]
    pub filter_value: Option<String>,
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

/// Submit today's report
#[utoipa::path(
    post,
    path = "/api/report/submit",
    request_body = SubmitReport,
    responses(
        (status = 200, description = "Report submitted", body = Object, example = json!({
            "message": "Report submitted"
        })),
        (status = 400, description = "Report is required"),
        (status = 409, description = "Report already submitted"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn submit_report(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<SubmitReport>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_id()?;
    state.reports.submit(employee_id, &payload.content).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Report submitted"
    })))
}

/// Whether the caller already submitted today's report
#[utoipa::path(
    get,
    path = "/api/report/check",
    responses(
        (status = 200, description = "Submission state for today", body = ReportCheck),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn check_report(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_id()?;
    let report = state.reports.todays_report(employee_id).await?;

    Ok(HttpResponse::Ok().json(ReportCheck {
        has_submitted_report: report.is_some(),
        report,
    }))
}

/// Today's attendance combined with reports (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/report/daily",
    responses(
        (status = 200, description = "Daily attendance rows", body = [DailyRow]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn daily_report(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    Ok(HttpResponse::Ok().json(state.reports.daily().await?))
}

/// Per-employee summary over a date range (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/report/weekly",
    params(RangeQuery),
    responses(
        (status = 200, description = "Summary per employee", body = [EmployeeSummary]),
        (status = 400, description = "Missing or invalid dates", body = Object, example = json!({
            "error": "validation_error",
            "message": "From and To dates are required"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn weekly_summary(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<RangeQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let from = required(&query.from, "From and To dates are required")?;
    let to = required(&query.to, "From and To dates are required")?;
    let period = ReportPeriod::range(from, to)?;

    let summary = state
        .reports
        .summary(period, query.department.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Per-employee summary for one month (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/report/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Summary per employee", body = [EmployeeSummary]),
        (status = 400, description = "Missing or invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn monthly_summary(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let period = ReportPeriod::month(required(&query.month, "Month is required")?)?;
    let summary = state
        .reports
        .summary(period, query.department.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Reports filed by one user (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/report/by-user",
    params(ByUserQuery),
    responses(
        (status = 200, description = "The user's reports", body = [DailyReport]),
        (status = 400, description = "Missing query params"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn reports_by_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ByUserQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let email = required(&query.email, "Missing query params")?;
    let period = ReportPeriod::from_filter(
        required(&query.filter_type, "Missing query params")?,
        required(&query.filter_value, "Missing query params")?,
    )?;

    Ok(HttpResponse::Ok().json(state.reports.by_user(email, period).await?))
}
