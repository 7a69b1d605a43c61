//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use ward_governance::LifecycleError;

/// Result alias for handler functions.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable error code for client handling.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-surface error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Domain error from the lifecycle engine.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Request body validation failure.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::Lifecycle(err) => {
                let status = StatusCode::from_u16(err.severity_class())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                // Internal detail stays in the logs, not the response body.
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "internal error");
                    "Internal server error".to_string()
                } else {
                    err.to_string()
                };
                (status, err.kind().code().to_string(), message)
            }
            Self::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                msg.clone(),
            ),
        };
        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_severity_class() {
        let err = ApiError::from(LifecycleError::NotLoggedIn);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let err = ApiError::from(LifecycleError::NotGeneralUser);
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);

        let err = ApiError::from(LifecycleError::MissingArmRequestInputs);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(LifecycleError::InvalidReviewArms(vec![]));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err = ApiError::from(LifecycleError::Internal("secret detail".to_string()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
