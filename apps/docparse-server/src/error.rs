//! Error types for the Docparse server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::parse::ParseError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Permission denied writing {0}")]
    PermissionDenied(String),

    #[error("Storage transport error: {0}")]
    Transport(String),

    #[error("No storage credentials configured for bucket: {0}")]
    ConfigNotFound(String),

    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Parse(e) => {
                let status = e.status_code();
                if status.is_server_error() {
                    tracing::error!(error = ?e, "Parse request failed: {}", e);
                } else {
                    tracing::warn!("Rejected parse request: {}", e);
                }
                (status, e.public_message())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
