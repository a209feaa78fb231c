//! Error types for FLEETGATE operations
//!
//! Every failure is classified once, where it is detected, into one of these
//! enums. Messages carry the operation and identifiers involved but never
//! secret material.

use std::time::Duration;
use thiserror::Error;

/// Document store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found in {collection}: {key}")]
    NotFound { collection: String, key: String },

    #[error("Write to {collection}/{key} rejected: {reason}")]
    Write {
        collection: String,
        key: String,
        reason: String,
    },

    #[error("Write conflict on {collection}/{key}")]
    Conflict { collection: String, key: String },

    #[error("Query on {collection} failed: {reason}")]
    Query { collection: String, reason: String },

    #[error("Store unavailable during {operation}: {reason}")]
    Unavailable { operation: String, reason: String },

    #[error("Store operation {operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Serialization failed ({context}): {reason}")]
    Serialization { context: String, reason: String },
}

impl StoreError {
    /// Whether a caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Timeout { .. } | StoreError::Unavailable { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn not_found(collection: impl Into<String>, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection: collection.into(),
            key: key.into(),
        }
    }

    pub fn unavailable(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Unavailable {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Credential validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Credential {id} is not active")]
    Inactive { id: String },

    #[error("Credential {id} not found")]
    NotFound { id: String },

    #[error("Credential lookup failed: {0}")]
    Store(#[from] StoreError),
}

impl CredentialError {
    /// Inactive and absent credentials are the caller's fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CredentialError::Store(_))
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
