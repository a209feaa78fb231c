//! FLEETGATE Test Utilities
//!
//! Shared test infrastructure for the fleetgate workspace:
//! - Store and cache doubles that count, fail, stall or record
//! - Proptest generators for identifiers, secrets, records and hints bodies
//! - Fixtures for seeded stores and request headers
//! - Assertions over store and credential results

pub use fleetgate_core::{
    CredentialError, CredentialRecord, HintsDocument, Predicate, SecretKey, StoreError,
    StoreResult, Visibility, WriteReceipt, ENROLLMENT_KEYS_COLLECTION, HINTS_COLLECTION,
};
pub use fleetgate_storage::{
    CacheStats, CredentialCache, DocumentStore, InMemoryDocumentStore, MokaCredentialCache,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// STORE DOUBLES
// ============================================================================

/// Call counters for a [`CountingStore`].
#[derive(Debug, Default)]
pub struct StoreCalls {
    pub creates: AtomicUsize,
    pub reads: AtomicUsize,
    pub queries: AtomicUsize,
    /// `(collection, key)` of every create, in call order.
    pub created: Mutex<Vec<(String, String)>>,
}

impl StoreCalls {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn created_keys(&self) -> Vec<(String, String)> {
        self.created
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }

    /// Total store round-trips.
    pub fn total(&self) -> usize {
        self.creates() + self.reads() + self.queries()
    }
}

/// Delegates to an [`InMemoryDocumentStore`] and counts every call.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: InMemoryDocumentStore,
    calls: Arc<StoreCalls>,
}

impl CountingStore {
    pub fn new(inner: InMemoryDocumentStore) -> Self {
        Self {
            inner,
            calls: Arc::new(StoreCalls::default()),
        }
    }

    /// Counter handle that stays valid after the store is moved into an `Arc`.
    pub fn calls(&self) -> Arc<StoreCalls> {
        Arc::clone(&self.calls)
    }

    pub fn inner(&self) -> &InMemoryDocumentStore {
        &self.inner
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn create(
        &self,
        collection: &str,
        key: &str,
        payload: &[u8],
        visibility: Visibility,
    ) -> StoreResult<WriteReceipt> {
        self.calls.creates.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut created) = self.calls.created.lock() {
            created.push((collection.to_string(), key.to_string()));
        }
        self.inner.create(collection, key, payload, visibility).await
    }

    async fn read(&self, collection: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.calls.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(collection, key).await
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> StoreResult<Vec<u8>> {
        self.calls.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(collection, predicate).await
    }
}

/// Store whose every call fails with the same error.
#[derive(Debug, Clone)]
pub struct FailingStore {
    error: StoreError,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self { error }
    }

    /// Fails every call as an unreachable store.
    pub fn unavailable() -> Self {
        Self::new(StoreError::unavailable("any", "store is down"))
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn create(
        &self,
        _collection: &str,
        _key: &str,
        _payload: &[u8],
        _visibility: Visibility,
    ) -> StoreResult<WriteReceipt> {
        Err(self.error.clone())
    }

    async fn read(&self, _collection: &str, _key: &str) -> StoreResult<Vec<u8>> {
        Err(self.error.clone())
    }

    async fn query(&self, _collection: &str, _predicate: &Predicate) -> StoreResult<Vec<u8>> {
        Err(self.error.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(self.error.clone())
    }
}

/// Sleeps before delegating each call.
#[derive(Debug)]
pub struct SlowStore {
    delay: Duration,
    inner: InMemoryDocumentStore,
}

impl SlowStore {
    pub fn new(delay: Duration, inner: InMemoryDocumentStore) -> Self {
        Self { delay, inner }
    }
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn create(
        &self,
        collection: &str,
        key: &str,
        payload: &[u8],
        visibility: Visibility,
    ) -> StoreResult<WriteReceipt> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(collection, key, payload, visibility).await
    }

    async fn read(&self, collection: &str, key: &str) -> StoreResult<Vec<u8>> {
        tokio::time::sleep(self.delay).await;
        self.inner.read(collection, key).await
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> StoreResult<Vec<u8>> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(collection, predicate).await
    }
}

/// Store whose queries wait until released, for cancellation tests.
///
/// Writes and reads delegate immediately. `entered` is notified once a
/// query is in flight.
#[derive(Debug, Default)]
pub struct GatedStore {
    inner: InMemoryDocumentStore,
    entered: Arc<tokio::sync::Notify>,
    release: Arc<tokio::sync::Notify>,
}

impl GatedStore {
    pub fn new(inner: InMemoryDocumentStore) -> Self {
        Self {
            inner,
            entered: Arc::new(tokio::sync::Notify::new()),
            release: Arc::new(tokio::sync::Notify::new()),
        }
    }

    pub fn entered(&self) -> Arc<tokio::sync::Notify> {
        Arc::clone(&self.entered)
    }

    pub fn release(&self) -> Arc<tokio::sync::Notify> {
        Arc::clone(&self.release)
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn create(
        &self,
        collection: &str,
        key: &str,
        payload: &[u8],
        visibility: Visibility,
    ) -> StoreResult<WriteReceipt> {
        self.inner.create(collection, key, payload, visibility).await
    }

    async fn read(&self, collection: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.inner.read(collection, key).await
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> StoreResult<Vec<u8>> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.query(collection, predicate).await
    }
}

// ============================================================================
// CACHE DOUBLES
// ============================================================================

/// Map-backed cache that records every `set`. Never evicts.
#[derive(Debug, Default)]
pub struct RecordingCache {
    entries: Mutex<HashMap<String, CredentialRecord>>,
    sets: Mutex<Vec<(String, u64)>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(identifier, cost)` passed to `set`, in call order.
    pub fn sets(&self) -> Vec<(String, u64)> {
        self.sets.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains_key(identifier))
            .unwrap_or(false)
    }
}

impl CredentialCache for RecordingCache {
    fn get(&self, identifier: &str) -> Option<CredentialRecord> {
        self.entries.lock().ok()?.get(identifier).cloned()
    }

    fn set(&self, identifier: &str, record: CredentialRecord, cost: u64) {
        if let Ok(mut sets) = self.sets.lock() {
            sets.push((identifier.to_string(), cost));
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(identifier.to_string(), record);
        }
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().map(|e| e.len() as u64).unwrap_or(0);
        CacheStats {
            inserts: self.sets().len() as u64,
            entry_count: entries,
            ..Default::default()
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for fleetgate inputs.

    use super::*;
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    /// Generate a credential identifier.
    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,32}"
    }

    /// Generate secret material, possibly multibyte.
    pub fn arb_secret() -> impl Strategy<Value = SecretKey> {
        "\\PC{0,64}".prop_map(SecretKey::new)
    }

    /// Generate a credential record with the given active flag.
    pub fn arb_credential_record(active: bool) -> impl Strategy<Value = CredentialRecord> {
        (arb_identifier(), arb_secret())
            .prop_map(move |(id, secret)| CredentialRecord::new(id, secret, active))
    }

    /// Generate a scalar JSON value.
    pub fn arb_json_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[ -~]{0,16}".prop_map(Value::String),
        ]
    }

    /// Generate a JSON object suitable as a hints request body.
    pub fn arb_hints_body() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-z][a-zA-Z0-9]{0,11}", arb_json_scalar(), 0..8).prop_map(
            |fields| {
                let map: Map<String, Value> = fields.into_iter().collect();
                Value::Object(map)
            },
        )
    }

    /// Generate a body that is not a decodable JSON object.
    pub fn arb_malformed_body() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            Just(b"".to_vec()),
            Just(b"[1,2,3]".to_vec()),
            Just(b"\"text\"".to_vec()),
            Just(b"{\"agentId\":".to_vec()),
            "[a-z]{1,16}".prop_map(|s| s.into_bytes()),
            any::<i64>().prop_map(|n| n.to_string().into_bytes()),
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use base64::Engine;

    /// Active record with the given identifier and secret.
    pub fn active_record(id: &str, secret: &str) -> CredentialRecord {
        CredentialRecord::new(id, SecretKey::new(secret), true)
    }

    /// Inactive record with the given identifier and secret.
    pub fn inactive_record(id: &str, secret: &str) -> CredentialRecord {
        CredentialRecord::new(id, SecretKey::new(secret), false)
    }

    /// In-memory store with `records` immediately visible in the
    /// enrollment-key collection, keyed by identifier.
    pub async fn seeded_store(records: &[CredentialRecord]) -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        for record in records {
            let payload = record
                .to_document()
                .unwrap_or_else(|e| panic!("encode fixture record: {}", e));
            store
                .create(
                    ENROLLMENT_KEYS_COLLECTION,
                    record.identifier(),
                    &payload,
                    Visibility::Immediate,
                )
                .await
                .unwrap_or_else(|e| panic!("seed fixture record: {}", e));
        }
        store
    }

    /// `Authorization` header value for an enrollment API key.
    pub fn api_key_header(id: &str, secret: &str) -> String {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", id, secret));
        format!("ApiKey {}", token)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over fleetgate results.

    use super::*;

    /// Assert that a store result is `NotFound`.
    #[track_caller]
    pub fn assert_store_not_found<T: std::fmt::Debug>(result: &StoreResult<T>) {
        match result {
            Err(StoreError::NotFound { .. }) => {}
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }

    /// Assert that a credential result is `Inactive` for `id`.
    #[track_caller]
    pub fn assert_inactive<T: std::fmt::Debug>(result: &Result<T, CredentialError>, id: &str) {
        match result {
            Err(CredentialError::Inactive { id: got }) => assert_eq!(got, id),
            other => panic!("Expected Inactive for {}, got: {:?}", id, other),
        }
    }

    /// Assert that a credential result is `NotFound` for `id`.
    #[track_caller]
    pub fn assert_credential_not_found<T: std::fmt::Debug>(
        result: &Result<T, CredentialError>,
        id: &str,
    ) {
        match result {
            Err(CredentialError::NotFound { id: got }) => assert_eq!(got, id),
            other => panic!("Expected NotFound for {}, got: {:?}", id, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counting_store_counts_each_call() {
        let store = CountingStore::default();
        let calls = store.calls();

        store
            .create("c", "k", b"{}", Visibility::Immediate)
            .await
            .unwrap();
        store.read("c", "k").await.unwrap();
        let _ = store.query("c", &Predicate::new().term("x", 1)).await;

        assert_eq!(calls.creates(), 1);
        assert_eq!(calls.reads(), 1);
        assert_eq!(calls.queries(), 1);
        assert_eq!(calls.total(), 3);
    }

    #[tokio::test]
    async fn test_failing_store_fails_everything() {
        let store = FailingStore::unavailable();
        assert!(store.read("c", "k").await.unwrap_err().is_retryable());
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_seeded_store_is_queryable() {
        let store = fixtures::seeded_store(&[fixtures::active_record("key-1", "secret")]).await;
        let bytes = store
            .query(
                ENROLLMENT_KEYS_COLLECTION,
                &Predicate::new().term("api_key_id", "key-1"),
            )
            .await
            .unwrap();
        let record = CredentialRecord::from_document(&bytes).unwrap();
        assert!(record.is_active());
    }

    #[test]
    fn test_recording_cache_records_sets() {
        let cache = RecordingCache::new();
        cache.set("k", fixtures::active_record("k", "abcd"), 4);

        assert!(cache.contains("k"));
        assert_eq!(cache.sets(), vec![("k".to_string(), 4)]);
        assert!(cache.get("k").is_some());
    }

    #[test]
    fn test_api_key_header_format() {
        // "id:secret" in standard base64
        assert_eq!(
            fixtures::api_key_header("id", "secret"),
            "ApiKey aWQ6c2VjcmV0"
        );
    }
}
