//! Error Types for the FLEETGATE API
//!
//! This module defines error handling for the HTTP layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//! - Conversions from the core store and credential errors
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fleetgate_core::{ConfigError, CredentialError, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to exactly one HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Client Errors (400, 401, 408, 413)
    // ========================================================================
    /// Request body is not a decodable JSON object
    DecodeRequest,

    /// Request body exceeds the accepted size
    PayloadTooLarge,

    /// Request did not complete within the whole-request deadline
    RequestTimeout,

    /// Authorization header is missing or malformed
    Unauthorized,

    /// Credential exists but is not active
    InactiveCredential,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// No enrollment record exists for the credential
    CredentialNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Store rejected the write as conflicting
    WriteConflict,

    // ========================================================================
    // Server Errors (500, 503, 504)
    // ========================================================================
    /// Store could not be reached
    StoreUnavailable,

    /// Store call exceeded its timeout
    StoreTimeout,

    /// Store rejected the write
    StoreWriteFailed,

    /// Store lookup failed
    StoreQueryFailed,

    /// Encoding or decoding a document failed
    SerializationFailed,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::DecodeRequest => StatusCode::BAD_REQUEST,

            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            ErrorCode::RequestTimeout => StatusCode::REQUEST_TIMEOUT,

            ErrorCode::Unauthorized | ErrorCode::InactiveCredential => StatusCode::UNAUTHORIZED,

            ErrorCode::CredentialNotFound => StatusCode::NOT_FOUND,

            ErrorCode::WriteConflict => StatusCode::CONFLICT,

            ErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::StoreTimeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::StoreWriteFailed
            | ErrorCode::StoreQueryFailed
            | ErrorCode::SerializationFailed
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::DecodeRequest => "Request body could not be decoded",
            ErrorCode::PayloadTooLarge => "Request body too large",
            ErrorCode::RequestTimeout => "Request timed out",
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::InactiveCredential => "Enrollment key is not active",
            ErrorCode::CredentialNotFound => "Enrollment key not found",
            ErrorCode::WriteConflict => "Write conflicts with an existing document",
            ErrorCode::StoreUnavailable => "Document store unavailable",
            ErrorCode::StoreTimeout => "Document store timed out",
            ErrorCode::StoreWriteFailed => "Document store write failed",
            ErrorCode::StoreQueryFailed => "Document store query failed",
            ErrorCode::SerializationFailed => "Serialization failed",
            ErrorCode::InternalError => "Internal server error",
        }
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
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Whether the failure is the server's fault (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create a DecodeRequest error.
    pub fn decode_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecodeRequest, message)
    }

    /// Create an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a SerializationFailed error.
    pub fn serialization_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationFailed, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create an InternalError describing bad configuration.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM CORE ERRORS
// ============================================================================

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::Unavailable { .. } => ErrorCode::StoreUnavailable,
            StoreError::Timeout { .. } => ErrorCode::StoreTimeout,
            StoreError::Conflict { .. } => ErrorCode::WriteConflict,
            StoreError::Write { .. } => ErrorCode::StoreWriteFailed,
            StoreError::Query { .. } | StoreError::NotFound { .. } => ErrorCode::StoreQueryFailed,
            StoreError::Serialization { .. } => ErrorCode::SerializationFailed,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Inactive { .. } => {
                ApiError::new(ErrorCode::InactiveCredential, err.to_string())
            }
            CredentialError::NotFound { .. } => {
                ApiError::new(ErrorCode::CredentialNotFound, err.to_string())
            }
            CredentialError::Store(inner) => inner.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::invalid_config(err.to_string())
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::DecodeRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ErrorCode::RequestTimeout.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(ErrorCode::InactiveCredential.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::CredentialNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::WriteConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::StoreUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::StoreTimeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ErrorCode::StoreWriteFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: ApiError = StoreError::Timeout {
            operation: "create".to_string(),
            after: Duration::from_secs(5),
        }
        .into();
        assert_eq!(err.code, ErrorCode::StoreTimeout);
        assert!(err.message.contains("create"));
        assert!(err.is_server_error());

        let err: ApiError = StoreError::Conflict {
            collection: ".fleet-hints".to_string(),
            key: "agent-1".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(!err.is_server_error());

        let err: ApiError = StoreError::unavailable("query", "connection refused").into();
        assert_eq!(err.code, ErrorCode::StoreUnavailable);
    }

    #[test]
    fn test_credential_error_conversion() {
        let err: ApiError = CredentialError::Inactive {
            id: "key-1".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InactiveCredential);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: ApiError = CredentialError::NotFound {
            id: "key-1".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::CredentialNotFound);

        let err: ApiError = CredentialError::Store(StoreError::Serialization {
            context: "decode".to_string(),
            reason: "eof".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::SerializationFailed);
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::decode_request("expected object");
        let json = serde_json::to_value(&err)?;

        assert_eq!(json["code"], "DECODE_REQUEST");
        assert_eq!(json["message"], "expected object");
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::from_code(ErrorCode::StoreWriteFailed);
        let display = format!("{}", err);

        assert!(display.contains("StoreWriteFailed"));
        assert!(display.contains("write failed"));
    }
}
