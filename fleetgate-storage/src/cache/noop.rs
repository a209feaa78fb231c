//! Cache that never stores anything.

use std::sync::atomic::{AtomicU64, Ordering};

use fleetgate_core::CredentialRecord;

use super::traits::{CacheStats, CredentialCache};

/// [`CredentialCache`] that discards every insert. Every lookup misses.
///
/// Used when caching is disabled (capacity 0) and as a test double.
#[derive(Debug, Default)]
pub struct NoopCredentialCache {
    misses: AtomicU64,
    inserts: AtomicU64,
}

impl NoopCredentialCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialCache for NoopCredentialCache {
    fn get(&self, _identifier: &str) -> Option<CredentialRecord> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn set(&self, _identifier: &str, _record: CredentialRecord, _cost: u64) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            ..Default::default()
        }
    }
}
