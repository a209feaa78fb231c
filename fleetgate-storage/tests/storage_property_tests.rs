//! Property-Based Tests for the document store and credential cache
//!
//! **Property 1: Read-after-write**
//! For any sequence of writes, an immediate write is readable as soon as
//! `create` returns, and per-key versions strictly increase.
//!
//! **Property 2: Cost budget**
//! For any sequence of inserts, the cache's weighted size never exceeds its
//! configured budget once pending maintenance has run.

use std::collections::HashMap;

use fleetgate_core::{CredentialRecord, SecretKey, Visibility};
use fleetgate_storage::{
    CacheConfig, CredentialCache, DocumentStore, InMemoryDocumentStore, MokaCredentialCache,
};
use proptest::prelude::*;

const COLLECTION: &str = ".fleet-hints";

fn visibility_strategy() -> impl Strategy<Value = Visibility> {
    prop_oneof![Just(Visibility::Immediate), Just(Visibility::Deferred)]
}

fn write_strategy() -> impl Strategy<Value = (String, Vec<u8>, Visibility)> {
    (
        "agent-[0-3]",
        prop::collection::vec(any::<u8>(), 0..32),
        visibility_strategy(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 1: Read-after-write**
    #[test]
    fn prop_immediate_writes_are_readable(
        writes in prop::collection::vec(write_strategy(), 1..30)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let store = InMemoryDocumentStore::new();
            let mut last_version: HashMap<String, u64> = HashMap::new();

            for (key, payload, visibility) in writes {
                let receipt = store
                    .create(COLLECTION, &key, &payload, visibility)
                    .await
                    .unwrap();

                let previous = last_version.insert(key.clone(), receipt.version).unwrap_or(0);
                prop_assert!(receipt.version > previous);

                if visibility.is_immediate() {
                    let read = store.read(COLLECTION, &key).await.unwrap();
                    prop_assert_eq!(read, payload);
                    prop_assert_eq!(store.pending_count(), 0);
                }
            }
            Ok(())
        })?;
    }

    /// **Property 2: Cost budget**
    #[test]
    fn prop_weighted_size_within_budget(
        inserts in prop::collection::vec(("[a-z]{1,6}", 0usize..200), 1..200),
        budget in 64u64..1024,
    ) {
        let cache = MokaCredentialCache::new(CacheConfig::new().with_max_cost(budget).without_ttl());

        for (id, secret_len) in inserts {
            let record = CredentialRecord::new(id.clone(), SecretKey::new("s".repeat(secret_len)), true);
            let cost = record.cost();
            cache.set(&id, record, cost);
        }
        cache.run_pending_tasks();

        prop_assert!(cache.stats().weighted_size <= budget);
    }
}
