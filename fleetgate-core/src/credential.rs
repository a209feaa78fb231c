//! Credential records
//!
//! A [`CredentialRecord`] is the authorization artifact for one enrollment
//! identifier. Its secret material is wrapped in [`SecretKey`] so that it can
//! be measured (for cache cost accounting) and compared, but never printed.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::StoreError;
use crate::Timestamp;

/// Opaque secret material of an enrollment credential.
///
/// `Debug` and `Display` are redacted. The only ways to observe the bytes are
/// [`SecretKey::expose`] and serialization back to the store.
#[derive(Clone, Debug)]
pub struct SecretKey(SecretString);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(SecretString::from(secret.into()))
    }

    /// Byte length of the secret. Used as the cache cost of the owning record.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Borrow the raw secret. Callers must not log the result.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SecretKey {}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl Serialize for SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretKey::new)
    }
}

/// Enrollment credential as stored in the enrollment-key collection.
///
/// Unknown fields in the stored document are ignored; the optional metadata
/// fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique credential identifier.
    pub api_key_id: String,
    /// Secret key material.
    pub api_key: SecretKey,
    /// Only active records are valid.
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl CredentialRecord {
    pub fn new(api_key_id: impl Into<String>, api_key: SecretKey, active: bool) -> Self {
        Self {
            api_key_id: api_key_id.into(),
            api_key,
            active,
            policy_id: None,
            name: None,
            created_at: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.api_key_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Cache cost of this record: the byte length of its secret.
    pub fn cost(&self) -> u64 {
        self.api_key.len() as u64
    }

    /// Decode a record from a stored document.
    pub fn from_document(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
            context: "decode enrollment key record".to_string(),
            reason: e.to_string(),
        })
    }

    /// Encode this record as a store document.
    pub fn to_document(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(|e| StoreError::Serialization {
            context: "encode enrollment key record".to_string(),
            reason: e.to_string(),
        })
    }
}
