//! Shared error handling for API endpoints.
//!
//! Every failure leaving the HTTP boundary carries the same structured body:
//! `{timestamp, status, error, message, path}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::auth::AuthError;

/// Extension trait for concise error mapping on Results.
pub trait ResultPathExt<T> {
    fn db_err(self, msg: &str, path: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultPathExt<T> for Result<T, E> {
    fn db_err(self, msg: &str, path: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            error!("{}: {}", msg, e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Database error", path)
        })
    }
}

/// Structured error body.
#[derive(Serialize)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
            path: path.into(),
        }
    }
}

/// API error with automatic conversion to the structured response.
pub struct ApiError {
    status: StatusCode,
    message: String,
    path: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, path)
    }

    pub fn unauthorized(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, path)
    }

    pub fn forbidden(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, path)
    }

    /// Map a gateway failure onto a status code at the given request path.
    pub fn from_auth(e: AuthError, path: &str) -> Self {
        let (status, message) = match &e {
            AuthError::BadCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
            AuthError::AccountNotFound => (StatusCode::UNAUTHORIZED, e.to_string()),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, (*msg).to_string()),
            AuthError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
            AuthError::EmailTaken => (StatusCode::CONFLICT, e.to_string()),
            AuthError::Token(_) | AuthError::Database(_) | AuthError::Hash => {
                error!(path = %path, error = %e, "Internal auth failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };
        Self::new(status, message, path)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody::new(self.status, self.message, self.path);
        (self.status, Json(body)).into_response()
    }
}
