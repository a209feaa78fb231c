//! Credential cache trait and statistics.

use fleetgate_core::CredentialRecord;

/// Concurrent credential cache.
///
/// Implementations are shared across request tasks behind an `Arc` and must
/// not require callers to lock. Neither method may touch the document store.
pub trait CredentialCache: Send + Sync {
    /// Return a copy of the cached record for `identifier`, if present.
    fn get(&self, identifier: &str) -> Option<CredentialRecord>;

    /// Insert or replace the entry for `identifier`.
    ///
    /// `cost` biases eviction: under pressure, costlier entries go first.
    fn set(&self, identifier: &str, record: CredentialRecord, cost: u64);

    /// Snapshot of usage counters.
    fn stats(&self) -> CacheStats;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of `set` calls.
    pub inserts: u64,
    /// Approximate number of entries currently in cache.
    pub entry_count: u64,
    /// Approximate sum of entry costs currently in cache.
    pub weighted_size: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
