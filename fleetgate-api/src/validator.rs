//! Credential Validator
//!
//! Resolves an enrollment key identifier to an active [`CredentialRecord`],
//! consulting the credential cache before the document store.
//!
//! Only records that were active when fetched are cached, and the cache is
//! written only after a store query completed successfully. A resolve whose
//! future is dropped mid-query therefore leaves the cache untouched.

use std::sync::Arc;

use fleetgate_core::{CredentialError, CredentialRecord, Predicate, StoreError, FIELD_API_KEY_ID};
use fleetgate_storage::{CredentialCache, DocumentStore};

use crate::telemetry::with_metrics;

/// Cache-fronted enrollment key lookup.
#[derive(Clone)]
pub struct CredentialValidator {
    cache: Arc<dyn CredentialCache>,
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl CredentialValidator {
    /// Create a new validator reading enrollment keys from `collection`.
    pub fn new(
        cache: Arc<dyn CredentialCache>,
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            store,
            collection: collection.into(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn CredentialCache> {
        &self.cache
    }

    /// Resolve `identifier` to an active credential.
    ///
    /// A cache hit is returned as-is, without re-checking the active flag.
    /// On a miss the store is queried; absent records fail with
    /// [`CredentialError::NotFound`], inactive ones with
    /// [`CredentialError::Inactive`] and are never cached.
    pub async fn resolve(&self, identifier: &str) -> Result<CredentialRecord, CredentialError> {
        if let Some(record) = self.cache.get(identifier) {
            with_metrics(|m| m.record_cache_lookup(true));
            tracing::debug!(api_key_id = identifier, "Enrollment key cache hit");
            return Ok(record);
        }
        with_metrics(|m| m.record_cache_lookup(false));

        let predicate = Predicate::new().term(FIELD_API_KEY_ID, identifier);
        let bytes = match self.store.query(&self.collection, &predicate).await {
            Ok(bytes) => bytes,
            Err(StoreError::NotFound { .. }) => {
                return Err(CredentialError::NotFound {
                    id: identifier.to_string(),
                })
            }
            Err(e) => return Err(CredentialError::Store(e)),
        };

        let record = CredentialRecord::from_document(&bytes)?;
        if !record.is_active() {
            return Err(CredentialError::Inactive {
                id: identifier.to_string(),
            });
        }

        let cost = record.cost();
        self.cache.set(identifier, record.clone(), cost);
        tracing::debug!(api_key_id = identifier, cost, "Enrollment key cached");

        Ok(record)
    }
}
