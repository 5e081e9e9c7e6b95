use crate::attendance::engine::{MarkIn, MarkOut};
use crate::attendance::reconciler::SweepReport;
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct MarkInResponse {
    #[schema(example = "Login time recorded", value_type = String)]
    pub message: &'static str,
    pub record: AttendanceRecord,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkOutResponse {
    #[schema(example = "Logout time recorded", value_type = String)]
    pub message: &'static str,
    pub record: AttendanceRecord,
    pub status: Option<AttendanceStatus>,
    #[schema(example = "8.00", value_type = Option<String>)]
    pub hours_worked: Option<Decimal>,
}

/// Mark-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/mark-in",
    responses(
        (status = 201, description = "Login time recorded", body = MarkInResponse),
        (status = 200, description = "Already marked in today, record unchanged", body = MarkInResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "not_found",
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_in(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_id()?;

    Ok(match state.attendance.mark_in(employee_id).await? {
        MarkIn::Recorded(record) => HttpResponse::Created().json(MarkInResponse {
            message: "Login time recorded",
            record,
        }),
        MarkIn::AlreadyMarkedIn(record) => HttpResponse::Ok().json(MarkInResponse {
            message: "Already marked in.",
            record,
        }),
    })
}

/// Mark-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/mark-out",
    responses(
        (status = 200, description = "Logout time recorded, or already marked out", body = MarkOutResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "No attendance record found for today", body = Object, example = json!({
            "error": "not_found",
            "message": "No attendance record found for today"
        })),
        (status = 422, description = "Logout time is earlier than login time"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_out(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_id()?;

    let (message, record) = match state.attendance.mark_out(employee_id).await? {
        MarkOut::Recorded(record) => ("Logout time recorded", record),
        MarkOut::AlreadyMarkedOut(record) => ("Already marked out", record),
    };

    Ok(HttpResponse::Ok().json(MarkOutResponse {
        message,
        status: record.status,
        hours_worked: record.hours_worked,
        record,
    }))
}

/// All attendance (admin only), newest first
#[utoipa::path(
    get,
    path = "/api/attendance/all",
    responses(
        (status = 200, description = "Attendance of all non-admin staff", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn all_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    Ok(HttpResponse::Ok().json(state.attendance.list_all().await?))
}

/// Caller's own attendance, oldest first
#[utoipa::path(
    get,
    path = "/api/attendance/my",
    responses(
        (status = 200, description = "Caller's attendance", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_id()?;
    Ok(HttpResponse::Ok().json(state.attendance.list_mine(employee_id).await?))
}

/// Run the absence sweep for today now (admin only)
#[utoipa::path(
    post,
    path = "/api/attendance/sweep",
    responses(
        (status = 200, description = "Sweep finished", body = SweepReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Employee list unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn run_sweep(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let today = state.clock.today();
    tracing::info!(user_id = auth.user_id, user = %auth.username, date = %today, "Manual absence sweep requested");
    let report = state.reconciler.run_sweep(today).await?;
    Ok(HttpResponse::Ok().json(report))
}
