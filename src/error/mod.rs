//! Error handling module.
//!
//! This module provides unified error handling with proper HTTP status code mapping
//! and a single JSON error body shape for every failed request.

pub mod codes;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub use codes::ErrorCode;

use crate::service::identifier::GeneratorError;

/// Request-level error type.
///
/// Every variant is terminal for the request that produced it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Endpoint called with the wrong HTTP verb.
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    /// Body is not valid JSON for the operation.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// `key` is missing or empty.
    #[error("key is required")]
    MissingKey,

    /// Key does not exist in the backend.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Identifier assignment failed.
    #[error("Identifier generation failed: {0}")]
    Generator(#[from] GeneratorError),

    /// Backend command failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Response could not be encoded.
    #[error("Response serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MethodNotAllowed(_) => ErrorCode::METHOD_NOT_ALLOWED,
            Self::MalformedBody(_) => ErrorCode::MALFORMED_BODY,
            Self::MissingKey => ErrorCode::MISSING_KEY,
            Self::KeyNotFound(_) => ErrorCode::KEY_NOT_FOUND,
            Self::Generator(_) => ErrorCode::GENERATOR_ERROR,
            Self::Backend(err) if err.is_unavailable() => ErrorCode::BACKEND_UNAVAILABLE,
            Self::Backend(_) => ErrorCode::BACKEND_ERROR,
            Self::Serialization(_) => ErrorCode::SERIALIZATION_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            // A read miss is a caller error, reported with its own code
            Self::MalformedBody(_) | Self::MissingKey | Self::KeyNotFound(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Backend(err) if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Generator(_) | Self::Backend(_) | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this failure counts under the `errors` counter.
    ///
    /// Method rejections are tracked separately.
    #[must_use]
    pub const fn counts_as_error(&self) -> bool {
        !matches!(self, Self::MethodNotAllowed(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().as_i32();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_code = code,
                status = %status,
                message = %message,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error_code = code,
                status = %status,
                message = %message,
                "Request rejected"
            );
        }

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });

        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

/// Backend-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Connection to the key-value store failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// No pooled connection could be obtained.
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// Command was rejected or failed on the server.
    #[error("Command failed: {0}")]
    Command(String),

    /// Client has been closed.
    #[error("Backend client closed")]
    Closed,
}

impl BackendError {
    /// Whether the error means the backend cannot serve requests right now.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Pool(_) | Self::Closed)
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias using `BackendError`.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
