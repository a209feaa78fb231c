//! FLEETGATE Storage - Document Store Gateway and Credential Cache
//!
//! Two independent halves:
//!
//! - [`store`]: the narrow create/read/query interface to the authoritative
//!   document store, with in-memory and REST adapters and a timeout-enforcing
//!   [`StoreGateway`]. Nothing here caches.
//! - [`cache`]: the cost-aware, concurrent credential cache that sits in
//!   front of the store on the validation hot path.

pub mod cache;
pub mod store;

pub use cache::{CacheConfig, CacheStats, CredentialCache, MokaCredentialCache, NoopCredentialCache};
pub use store::{
    DocumentStore, HttpDocumentStore, HttpStoreConfig, InMemoryDocumentStore, StoreGateway,
    StoreObserver,
};
