//! Error types for the social backend.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Message returned to clients for every server-class error.
pub const GENERIC_SERVER_ERROR: &str = "the server encountered a problem";

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("a user with that username already exists")]
    DuplicateUsername,

    #[error("a user with that email already exists")]
    DuplicateEmail,

    #[error("Version conflict on post {id}: expected version {expected} is stale")]
    VersionConflict { id: i64, expected: i32 },

    #[error("Bad query: {0}")]
    BadQuery(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // === Server Errors ===
    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Notification delivery failed: {0}")]
    DeliveryFailure(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::UserNotFound(_) | Self::PostNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Conflict(_)
            | Self::DuplicateUsername
            | Self::DuplicateEmail
            | Self::VersionConflict { .. } => StatusCode::CONFLICT,
            Self::BadQuery(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,

            // 5xx Server Errors
            Self::Timeout(_)
            | Self::DeliveryFailure(_)
            | Self::Database(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::PostNotFound(_) => "POST_NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::DuplicateUsername => "DUPLICATE_USERNAME",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::BadQuery(_) => "BAD_QUERY",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::DeliveryFailure(_) => "DELIVERY_FAILURE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Server errors keep their detail in the log only
        let message = if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
            GENERIC_SERVER_ERROR.to_string()
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_kinds_map_to_409() {
        assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::DuplicateUsername.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::VersionConflict { id: 1, expected: 2 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_ne!(
            AppError::DuplicateEmail.error_code(),
            AppError::DuplicateUsername.error_code()
        );
    }

    #[test]
    fn test_timeout_is_distinct_server_error() {
        let err = AppError::Timeout("followers.follow".to_string());
        assert!(err.is_server_error());
        assert_eq!(err.error_code(), "TIMEOUT");
    }

    #[test]
    fn test_expected_outcomes_are_client_errors() {
        let errors = [
            AppError::NotFound("x".to_string()),
            AppError::Conflict("x".to_string()),
            AppError::VersionConflict { id: 1, expected: 1 },
            AppError::BadQuery("x".to_string()),
        ];
        for err in errors {
            assert!(err.status_code().is_client_error());
            assert!(!err.is_server_error());
        }
    }

    #[tokio::test]
    async fn test_server_error_response_hides_detail() {
        let response = AppError::Database("connection reset by peer".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
        assert_eq!(body["error"]["message"], GENERIC_SERVER_ERROR);
    }
}
