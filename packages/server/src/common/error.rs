//! API error taxonomy.
//!
//! Every fallible operation in the domain layer returns `ApiError`;
//! the axum layer maps it to a status code via `IntoResponse`. Failures
//! inside a transaction roll back fully before the error surfaces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential supplied at all
    #[error("Unauthorized: API token missing")]
    TokenMissing,

    /// A credential was supplied but matches no node
    #[error("Forbidden: invalid or expired token")]
    TokenUnknown,

    /// Authenticated but not entitled (inactive, no consent, wrong owner)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Result checksum did not match the canonical payload digest
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// Node already holds an active job
    #[error("Rate limit: {0}")]
    Conflict(String),

    #[error("No pending jobs available")]
    NoJobAvailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::TokenMissing => StatusCode::UNAUTHORIZED,
            ApiError::TokenUnknown | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) | ApiError::Integrity(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NoJobAvailable => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the log, not the response body
        let message = match &self {
            ApiError::Database(error) => {
                tracing::error!(error = %error, "database error");
                "Internal server error".to_string()
            }
            ApiError::Internal(error) => {
                tracing::error!(error = %error, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_unknown_tokens_map_differently() {
        assert_eq!(ApiError::TokenMissing.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::TokenUnknown.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn conflict_maps_to_429() {
        let err = ApiError::Conflict("node already has an active job".into());
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn empty_queue_is_404_not_500() {
        assert_eq!(ApiError::NoJobAvailable.status_code(), StatusCode::NOT_FOUND);
    }
}
