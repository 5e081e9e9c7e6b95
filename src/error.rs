use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::store::StoreError;

/// Failures surfaced to API callers. Soft conflicts (repeat mark-in,
/// repeat mark-out) are not errors and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// A session whose times cannot produce a valid duration.
    #[error("{0}")]
    InvalidSession(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::Forbidden(_) => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidSession(_) => "invalid_session",
            AppError::Store(_) => "store_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidSession(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": message,
        }))
    }
}

/// `JsonConfig` error handler. Extractor failures get the same body as
/// every other client error, without serde's position details.
pub fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, path = %req.path(), "Rejected JSON body");
    AppError::Validation("Invalid JSON body".to_string()).into()
}

/// `QueryConfig` error handler.
pub fn query_error(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, path = %req.path(), "Rejected query string");
    AppError::Validation("Invalid query parameters".to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn store_errors_hide_backend_details() {
        let err = AppError::from(StoreError::Backend("connection refused 10.0.0.4".into()));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "store_error");
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[test]
    fn client_errors_carry_their_message() {
        let err = AppError::NotFound("No attendance record found for today".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_string(), "No attendance record found for today");
    }
}
