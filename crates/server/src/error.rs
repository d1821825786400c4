//! Unified error handling for the server.
//!
//! Every handler returns [`AppResult`]; each variant declares its HTTP status
//! and is rendered as `{"error": message, "status": code}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use registry::InferenceError;
use serde_json::json;

/// Public message for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";

/// Application error type with HTTP response mapping.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data (400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error (500). The message is what clients see.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 500 with the generic public message.
    pub fn internal() -> Self {
        AppError::Internal(INTERNAL_ERROR_MESSAGE.into())
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) | AppError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = axum::Json(json!({
            "error": self.message(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        if err.is_client_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::internal()
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
