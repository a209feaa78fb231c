//! Timeout-enforcing gateway in front of any [`DocumentStore`].
//!
//! Every call is bounded by a per-call timeout; a timeout fails the call with
//! the retryable [`StoreError::Timeout`]. Nothing is retried here. Dropping the
//! returned future aborts the in-flight store call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fleetgate_core::{Predicate, StoreError, StoreResult, Visibility, WriteReceipt};
use std::future::Future;

use super::DocumentStore;

/// Default per-call timeout.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Receives one observation per completed gateway call.
pub trait StoreObserver: Send + Sync {
    fn observe(&self, operation: &'static str, outcome: &'static str, elapsed: Duration);
}

/// Stable outcome label for a store result.
pub fn outcome_label<T>(result: &StoreResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(StoreError::NotFound { .. }) => "not_found",
        Err(StoreError::Timeout { .. }) => "timeout",
        Err(StoreError::Conflict { .. }) => "conflict",
        Err(_) => "error",
    }
}

/// Document Store Gateway.
#[derive(Clone)]
pub struct StoreGateway {
    inner: Arc<dyn DocumentStore>,
    timeout: Duration,
    observer: Option<Arc<dyn StoreObserver>>,
}

impl StoreGateway {
    pub fn new(inner: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn timed<T, F>(&self, operation: &'static str, collection: &str, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation: operation.to_string(),
                after: self.timeout,
            }),
        };
        let elapsed = start.elapsed();
        let outcome = outcome_label(&result);

        if let Some(observer) = &self.observer {
            observer.observe(operation, outcome, elapsed);
        }
        tracing::debug!(
            operation,
            collection,
            outcome,
            duration_ms = elapsed.as_millis() as u64,
            "Store call completed"
        );

        result
    }
}

#[async_trait]
impl DocumentStore for StoreGateway {
    async fn create(
        &self,
        collection: &str,
        key: &str,
        payload: &[u8],
        visibility: Visibility,
    ) -> StoreResult<WriteReceipt> {
        self.timed(
            "create",
            collection,
            self.inner.create(collection, key, payload, visibility),
        )
        .await
    }

    async fn read(&self, collection: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.timed("read", collection, self.inner.read(collection, key))
            .await
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> StoreResult<Vec<u8>> {
        self.timed("query", collection, self.inner.query(collection, predicate))
            .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.timed("ping", "", self.inner.ping()).await
    }
}
