//! In-memory document store.
//!
//! Models the visibility semantics of a near-real-time search store: writes
//! with [`Visibility::Deferred`] sit in a per-collection pending buffer until
//! the next refresh, while [`Visibility::Immediate`] writes force a refresh of
//! their collection before returning. Used for development and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use fleetgate_core::{Predicate, StoreError, StoreResult, Visibility, WriteReceipt};
use serde_json::Value;
use tokio::task::JoinHandle;

use super::DocumentStore;

#[derive(Debug, Clone)]
struct StoredDocument {
    payload: Vec<u8>,
    version: u64,
}

#[derive(Debug, Default)]
struct Collection {
    /// Latest visible version per key. Ordered so that `query` is deterministic.
    visible: BTreeMap<String, StoredDocument>,
    /// Writes not yet visible, in arrival order.
    pending: Vec<(String, StoredDocument)>,
    /// Highest version ever assigned per key, visible or not.
    versions: HashMap<String, u64>,
}

impl Collection {
    fn publish_pending(&mut self) -> usize {
        let published = self.pending.len();
        for (key, doc) in self.pending.drain(..) {
            self.visible.insert(key, doc);
        }
        published
    }
}

/// Versioned in-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

/// Shortest refresh period the refresher accepts.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

fn poisoned(operation: &str) -> StoreError {
    StoreError::unavailable(operation, "in-memory store lock poisoned")
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every pending write visible. Returns the number of documents published.
    pub fn refresh(&self) -> StoreResult<usize> {
        let mut collections = self.collections.write().map_err(|_| poisoned("refresh"))?;
        Ok(collections.values_mut().map(Collection::publish_pending).sum())
    }

    /// Number of writes waiting for a refresh.
    pub fn pending_count(&self) -> usize {
        self.collections
            .read()
            .map(|c| c.values().map(|col| col.pending.len()).sum())
            .unwrap_or(0)
    }

    /// Number of visible documents in `collection`.
    pub fn visible_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, |col| col.visible.len()))
            .unwrap_or(0)
    }

    /// Periodically publish pending writes, bounding deferred visibility to `every`.
    ///
    /// Periods below one millisecond are raised to one millisecond.
    pub fn spawn_refresher(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let every = every.max(MIN_REFRESH_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match store.refresh() {
                    Ok(0) => {}
                    Ok(published) => tracing::trace!(published, "Published deferred writes"),
                    Err(err) => {
                        tracing::error!(error = %err, "In-memory store refresh failed");
                        break;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(
        &self,
        collection: &str,
        key: &str,
        payload: &[u8],
        visibility: Visibility,
    ) -> StoreResult<WriteReceipt> {
        if key.is_empty() {
            return Err(StoreError::Write {
                collection: collection.to_string(),
                key: key.to_string(),
                reason: "document key must not be empty".to_string(),
            });
        }

        let mut collections = self.collections.write().map_err(|_| poisoned("create"))?;
        let col = collections.entry(collection.to_string()).or_default();

        let version = col
            .versions
            .entry(key.to_string())
            .and_modify(|v| *v += 1)
            .or_insert(1);
        let doc = StoredDocument {
            payload: payload.to_vec(),
            version: *version,
        };
        let receipt = WriteReceipt {
            collection: collection.to_string(),
            key: key.to_string(),
            version: doc.version,
            visibility,
        };

        col.pending.push((key.to_string(), doc));
        if visibility.is_immediate() {
            col.publish_pending();
        }

        Ok(receipt)
    }

    async fn read(&self, collection: &str, key: &str) -> StoreResult<Vec<u8>> {
        let collections = self.collections.read().map_err(|_| poisoned("read"))?;
        collections
            .get(collection)
            .and_then(|col| col.visible.get(key))
            .map(|doc| doc.payload.clone())
            .ok_or_else(|| StoreError::not_found(collection, key))
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> StoreResult<Vec<u8>> {
        let collections = self.collections.read().map_err(|_| poisoned("query"))?;
        let Some(col) = collections.get(collection) else {
            return Err(StoreError::not_found(collection, predicate.to_string()));
        };

        for doc in col.visible.values() {
            // Documents that are not JSON cannot match a term query.
            let Ok(value) = serde_json::from_slice::<Value>(&doc.payload) else {
                continue;
            };
            if predicate.matches(&value) {
                return Ok(doc.payload.clone());
            }
        }

        Err(StoreError::not_found(collection, predicate.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLLECTION: &str = ".fleet-hints";

    #[tokio::test]
    async fn test_immediate_write_is_readable() {
        let store = InMemoryDocumentStore::new();
        let receipt = store
            .create(COLLECTION, "agent-1", br#"{"a":1}"#, Visibility::Immediate)
            .await
            .unwrap();

        assert_eq!(receipt.version, 1);
        assert_eq!(store.read(COLLECTION, "agent-1").await.unwrap(), br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_deferred_write_invisible_until_refresh() {
        let store = InMemoryDocumentStore::new();
        store
            .create(COLLECTION, "agent-1", br#"{"a":1}"#, Visibility::Deferred)
            .await
            .unwrap();

        let err = store.read(COLLECTION, "agent-1").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.pending_count(), 1);

        assert_eq!(store.refresh().unwrap(), 1);
        assert_eq!(store.pending_count(), 0);
        assert!(store.read(COLLECTION, "agent-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_immediate_write_publishes_earlier_pending_writes() {
        let store = InMemoryDocumentStore::new();
        store
            .create(COLLECTION, "agent-1", b"{}", Visibility::Deferred)
            .await
            .unwrap();
        store
            .create(COLLECTION, "agent-2", b"{}", Visibility::Immediate)
            .await
            .unwrap();

        assert!(store.read(COLLECTION, "agent-1").await.is_ok());
        assert_eq!(store.visible_count(COLLECTION), 2);
    }

    #[tokio::test]
    async fn test_repeat_create_produces_new_version() {
        let store = InMemoryDocumentStore::new();
        let first = store
            .create(COLLECTION, "agent-1", br#"{"v":1}"#, Visibility::Immediate)
            .await
            .unwrap();
        let second = store
            .create(COLLECTION, "agent-1", br#"{"v":2}"#, Visibility::Immediate)
            .await
            .unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(store.read(COLLECTION, "agent-1").await.unwrap(), br#"{"v":2}"#);
        assert_eq!(store.visible_count(COLLECTION), 1);
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .create(COLLECTION, "", b"{}", Visibility::Immediate)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[tokio::test]
    async fn test_query_exact_match() {
        let store = InMemoryDocumentStore::new();
        let keys = ".fleet-enrollment-api-keys";
        for (id, active) in [("key-1", true), ("key-2", false)] {
            let doc = serde_json::to_vec(&json!({"api_key_id": id, "active": active})).unwrap();
            store.create(keys, id, &doc, Visibility::Immediate).await.unwrap();
        }

        let hit = store
            .query(keys, &Predicate::new().term("api_key_id", "key-2"))
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&hit).unwrap();
        assert_eq!(value["active"], json!(false));

        let miss = store
            .query(keys, &Predicate::new().term("api_key_id", "key-2").term("active", true))
            .await
            .unwrap_err();
        assert!(miss.is_not_found());
    }

    #[tokio::test]
    async fn test_query_unknown_collection_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .query("missing", &Predicate::new().term("a", 1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_publishes_deferred_writes() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let handle = store.spawn_refresher(Duration::from_millis(100));

        store
            .create(COLLECTION, "agent-1", b"{}", Visibility::Deferred)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(store.read(COLLECTION, "agent-1").await.is_ok());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_refresh_period_keeps_refresher_alive() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let handle = store.spawn_refresher(Duration::ZERO);

        store
            .create(COLLECTION, "agent-1", b"{}", Visibility::Deferred)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!handle.is_finished());
        assert!(store.read(COLLECTION, "agent-1").await.is_ok());
        handle.abort();
    }
}
