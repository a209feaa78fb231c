//! Document Store Gateway
//!
//! [`DocumentStore`] is the only way the service talks to the authoritative
//! store. Implementations are stateless conduits: they hold connection state
//! but never application data, and they never cache.

pub mod gateway;
pub mod http;
pub mod memory;

pub use gateway::{StoreGateway, StoreObserver};
pub use http::{HttpDocumentStore, HttpStoreConfig};
pub use memory::InMemoryDocumentStore;

use async_trait::async_trait;
use fleetgate_core::{Predicate, StoreResult, Visibility, WriteReceipt};

/// Create/read/query access to an external document store.
///
/// Implementations must be safe to share across tasks without external
/// locking.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `payload` under `key` within `collection`.
    ///
    /// With [`Visibility::Immediate`] the call must not return `Ok` until the
    /// document is readable through [`read`](Self::read) and
    /// [`query`](Self::query) on the same store. Writing an existing key
    /// creates a new version of the document.
    async fn create(
        &self,
        collection: &str,
        key: &str,
        payload: &[u8],
        visibility: Visibility,
    ) -> StoreResult<WriteReceipt>;

    /// Fetch the latest visible version of a document.
    async fn read(&self, collection: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// Fetch the first visible document matching every term of `predicate`.
    async fn query(&self, collection: &str, predicate: &Predicate) -> StoreResult<Vec<u8>>;

    /// Cheap liveness probe used by readiness checks.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
