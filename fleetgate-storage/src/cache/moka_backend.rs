//! Cost-aware credential cache backed by `moka`.
//!
//! Capacity is a budget of total entry cost (bytes of secret material), not
//! an entry count. moka admits new entries with TinyLFU and evicts with a
//! weighted LRU, so frequently reused records survive even when they are
//! large, while rarely used expensive entries are the first to go.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fleetgate_core::CredentialRecord;
use moka::sync::Cache;

use super::traits::{CacheStats, CredentialCache};

/// Configuration for [`MokaCredentialCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum sum of entry costs held at once.
    pub max_cost: u64,
    /// Maximum age of an entry. `None` keeps entries until evicted.
    pub time_to_live: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cost: 1024 * 1024,
            time_to_live: Some(Duration::from_secs(300)),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total cost budget.
    pub fn with_max_cost(mut self, max_cost: u64) -> Self {
        self.max_cost = max_cost;
        self
    }

    /// Set the entry time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Keep entries until capacity eviction, accepting unbounded staleness.
    pub fn without_ttl(mut self) -> Self {
        self.time_to_live = None;
        self
    }
}

#[derive(Debug, Clone)]
struct CachedCredential {
    record: CredentialRecord,
    cost: u64,
}

/// moka weights are `u32`. Zero-cost entries would never count against
/// capacity, so every entry weighs at least one unit.
fn entry_weight(cost: u64) -> u32 {
    cost.clamp(1, u64::from(u32::MAX)) as u32
}

/// Production [`CredentialCache`].
pub struct MokaCredentialCache {
    inner: Cache<String, CachedCredential>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

impl MokaCredentialCache {
    pub fn new(config: CacheConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_cost)
            .weigher(|_key: &String, entry: &CachedCredential| entry_weight(entry.cost));
        if let Some(ttl) = config.time_to_live {
            builder = builder.time_to_live(ttl);
        }

        Self {
            inner: builder.build(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cost recorded for `identifier`, if cached. Does not count as a hit.
    pub fn entry_cost(&self, identifier: &str) -> Option<u64> {
        self.inner.get(identifier).map(|entry| entry.cost)
    }

    /// Drop every entry. Process-level reset only; not part of the
    /// validation contract.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Apply pending admissions, evictions and expirations now.
    pub fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks();
    }
}

impl CredentialCache for MokaCredentialCache {
    fn get(&self, identifier: &str) -> Option<CredentialRecord> {
        match self.inner.get(identifier) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.record)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, identifier: &str, record: CredentialRecord, cost: u64) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
        self.inner
            .insert(identifier.to_string(), CachedCredential { record, cost });
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            entry_count: self.inner.entry_count(),
            weighted_size: self.inner.weighted_size(),
        }
    }
}
