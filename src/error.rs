//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type for the server. Each variant maps
//! to one HTTP status code and is rendered as a JSON body of the form
//! `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// JSON error response body.
///
/// ```json
/// { "error": "Entry not found" }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// | Variant      | HTTP Status               |
/// |--------------|---------------------------|
/// | `Validation` | 400 Bad Request           |
/// | `NotFound`   | 404 Not Found             |
/// | `Internal`   | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing client input.
    #[error("{0}")]
    Validation(String),

    /// The referenced entry or dropdown value does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Storage read/write or codec failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for the `Entry not found` error.
    #[must_use]
    pub fn entry_not_found() -> Self {
        Self::NotFound("Entry not found".to_string())
    }

    /// Shorthand for the `Value not found` error.
    #[must_use]
    pub fn value_not_found() -> Self {
        Self::NotFound("Value not found".to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}

impl From<sqlx::migrate::MigrateError> for ApiError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Internal(format!("schema migration failed: {err}"))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("file storage error: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
