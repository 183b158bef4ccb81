//! Error types for the HTTP surface.
//!
//! Every failure leaves a handler as `{ "code": "...", "message": "..." }`
//! with the matching status code:
//!
//! ```text
//! NotFound                              → 404 NOT_FOUND
//! Validation                            → 400 VALIDATION_ERROR
//! InsufficientStock / InsufficientPoints → 422
//! InvalidStateTransition                → 409 INVALID_STATE_TRANSITION
//! Conflict                              → 409 CONFLICT
//! missing / bad token                   → 401 UNAUTHORIZED
//! not an admin                          → 403 FORBIDDEN
//! anything else                         → 500 (logged, generic message)
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use showroom_core::CoreError;
use showroom_db::DbError;
use tracing::{error, warn};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Admin role required")]
    Forbidden,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    /// HTTP status and stable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Domain(err) => match err {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::InsufficientStock { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_STOCK")
                }
                CoreError::InsufficientPoints { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_POINTS")
                }
                CoreError::InvalidStateTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION")
                }
                CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            },
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::Domain(err) => ApiError::Domain(err),
            DbError::UniqueViolation { field, value } => {
                ApiError::Domain(CoreError::conflict(format!("{field} '{value}' already exists")))
            }
            DbError::ForeignKeyViolation { message } => {
                ApiError::Domain(CoreError::conflict(message))
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            if status == StatusCode::CONFLICT {
                warn!(code, error = %self, "Request conflicted");
            }
            self.to_string()
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use showroom_core::ValidationError;

    #[test]
    fn test_domain_status_mapping() {
        let cases = [
            (CoreError::not_found("Sale", "s-1"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                ValidationError::Required { field: "items".to_string() }.into(),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                CoreError::InsufficientPoints {
                    customer_id: "c-1".to_string(),
                    available: 40,
                    required: 50,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "INSUFFICIENT_POINTS",
            ),
            (CoreError::conflict("stale"), StatusCode::CONFLICT, "CONFLICT"),
        ];

        for (err, status, code) in cases {
            assert_eq!(ApiError::from(err).status_and_code(), (status, code));
        }
    }

    #[test]
    fn test_db_errors_hide_details() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".to_string()));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(DbError::not_found("GiftItem", "g-1"));
        assert_eq!(err.status_and_code().1, "NOT_FOUND");
    }
}
