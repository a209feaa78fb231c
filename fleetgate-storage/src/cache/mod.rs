//! Credential cache.
//!
//! An in-memory, cost-bounded cache mapping a credential identifier to its
//! validated [`CredentialRecord`](fleetgate_core::CredentialRecord). It only
//! ever holds records that were active when fetched.
//!
//! # Staleness
//!
//! There is no invalidation channel: a credential deactivated in the store
//! after being cached stays valid from the cache's point of view until it is
//! evicted or its time-to-live expires. [`CacheConfig::time_to_live`] bounds
//! that window; setting it to `None` accepts unbounded staleness.

pub mod moka_backend;
pub mod noop;
pub mod traits;

pub use moka_backend::{CacheConfig, MokaCredentialCache};
pub use noop::NoopCredentialCache;
pub use traits::{CacheStats, CredentialCache};
