//! Typed failure taxonomy for store operations and HTTP handlers.
//!
//! Every expected failure maps onto the response envelope
//! `{"success": false, "message": "..."}` with the status class the front
//! end keys off: 400 validation/conflict/integrity, 401/403 auth, 404 not
//! found, 500 everything else. Unexpected failures are logged server-side
//! and reach the caller only as a generic "Server error".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Result alias used by the store and the gateway handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// All failure kinds a request can produce.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed required input.
    #[error("{0}")]
    Validation(String),

    /// Duplicate email or role name.
    #[error("{0}")]
    Conflict(String),

    /// Unknown id or key.
    #[error("{0}")]
    NotFound(String),

    /// No bearer credential presented.
    #[error("{0}")]
    Unauthorized(String),

    /// Credential presented but invalid or expired.
    #[error("{0}")]
    Forbidden(String),

    /// Referential constraint blocked the operation.
    #[error("{0}")]
    Integrity(String),

    /// Anything unexpected. The cause is logged, never sent to the caller.
    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::Integrity(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(cause) = &self {
            tracing::error!("unexpected failure: {cause:#}");
        }
        let body = serde_json::json!({
            "success": false,
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_failure_class() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Integrity("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_hides_the_cause() {
        let err = ApiError::Internal(anyhow::anyhow!("disk exploded"));
        assert_eq!(err.to_string(), "Server error");
    }
}
