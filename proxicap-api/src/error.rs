//! Error Types for the ProxiCap API
//!
//! - `ApiError` for structured error responses
//! - `ErrorCode` for categorizing errors
//! - `IntoResponse` for Axum
//!
//! The two device-facing codes (`InvalidJson`, `MethodNotAllowed`) render as
//! bare `text/plain` bodies because the firmware and the dashboard compare
//! the body text. Everything else renders as JSON.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use proxicap_core::{ConfigError, IngestError};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{INVALID_JSON_MESSAGE, METHOD_NOT_ALLOWED_MESSAGE};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Client Errors (400, 405)
    // ========================================================================
    /// Ingest body is not a valid device payload
    InvalidJson,

    /// Configuration or startup input is invalid
    InvalidInput,

    /// HTTP method not supported on this path
    MethodNotAllowed,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidJson | ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidJson => INVALID_JSON_MESSAGE,
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MethodNotAllowed => METHOD_NOT_ALLOWED_MESSAGE,
            ErrorCode::InternalError => "Internal server error",
        }
    }

    /// Whether the response body is the bare message rather than JSON.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, ErrorCode::InvalidJson | ErrorCode::MethodNotAllowed)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details. Never sent on plain-text responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Malformed ingest payload. The body is always "Invalid JSON"; the
    /// parser's reason goes into `details` for logs only.
    pub fn invalid_json(reason: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::InvalidJson)
            .with_details(serde_json::json!({ "reason": reason.into() }))
    }

    pub fn method_not_allowed() -> Self {
        Self::from_code(ErrorCode::MethodNotAllowed)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.code.is_plain_text() {
            (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                self.message,
            )
                .into_response()
        } else {
            (status, Json(self)).into_response()
        }
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MalformedPayload { reason } => ApiError::invalid_json(reason),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}
