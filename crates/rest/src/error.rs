//! Error types for the bioref HTTP API.
//!
//! Every error becomes a JSON body of the form `{"error": "..."}` with an
//! appropriate status code:
//!
//! | Error | HTTP status |
//! |-------|-------------|
//! | `BadRequest` | 400 |
//! | `Upstream` | 500 |
//!
//! Client-input problems carry their message to the caller. Upstream
//! database failures are logged server-side and answered with a generic
//! message so internals never leak.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bioref_export::ExportError;
use bioref_store::StoreError;
use std::fmt;
use tracing::error;

/// The primary error type for API operations.
#[derive(Debug)]
pub enum RestError {
    /// The request was malformed or named something outside the allow-lists
    /// (HTTP 400).
    BadRequest {
        /// Human-readable message returned to the caller.
        message: String,
    },

    /// The reference database lookup failed (HTTP 500). The message is
    /// logged, never returned.
    Upstream {
        /// Internal description of the failure.
        message: String,
    },
}

impl RestError {
    /// Convenience constructor for client-input errors.
    pub fn bad_request(message: impl Into<String>) -> Self {
        RestError::BadRequest {
            message: message.into(),
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::BadRequest { message } => write!(f, "Bad request: {}", message),
            RestError::Upstream { message } => write!(f, "Upstream failure: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RestError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            RestError::Upstream { message } => {
                // The cause stays in the server log.
                error!(cause = %message, "reference database lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error querying reference data".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        match err {
            // Filter errors are caller mistakes: unknown table, field, or
            // combinator.
            StoreError::Filter(e) => RestError::BadRequest {
                message: e.to_string(),
            },
            StoreError::Backend(e) => RestError::Upstream {
                message: e.to_string(),
            },
        }
    }
}

impl From<ExportError> for RestError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnknownFormat { .. } => RestError::BadRequest {
                message: "Invalid format for download".to_string(),
            },
            other => RestError::Upstream {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for API operations.
pub type RestResult<T> = Result<T, RestError>;
