//! FLEETGATE Core - Data Types and Error Taxonomy
//!
//! Pure data structures shared by the storage and API crates:
//! - Credential records and their secret material
//! - Hints documents, write receipts, visibility directives, query predicates
//! - The error taxonomy every other crate classifies into
//!
//! This crate performs no I/O.

pub mod credential;
pub mod document;
pub mod error;

pub use credential::{CredentialRecord, SecretKey};
pub use document::{HintsDocument, Predicate, Visibility, WriteReceipt};
pub use error::{ConfigError, CredentialError, StoreError, StoreResult};

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// WELL-KNOWN COLLECTIONS
// ============================================================================

/// Collection holding per-agent hints documents.
pub const HINTS_COLLECTION: &str = ".fleet-hints";

/// Collection holding enrollment API key records.
pub const ENROLLMENT_KEYS_COLLECTION: &str = ".fleet-enrollment-api-keys";

/// Field of an enrollment key document that carries the credential identifier.
pub const FIELD_API_KEY_ID: &str = "api_key_id";

