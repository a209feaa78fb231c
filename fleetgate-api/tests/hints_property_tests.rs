//! Property-Based Tests for credential validation and hints persistence
//!
//! **Property 1: Persisted hints mirror the request**
//! For any JSON object body, the stored document equals the body with
//! `agentId` set to the path identity, and is readable as soon as the
//! request returns.
//!
//! **Property 2: Malformed bodies never reach the store**
//!
//! **Property 3: Cache admission**
//! For any mix of active and inactive credentials resolved in any order,
//! inactive identifiers are never cached, each active identifier is queried
//! at most once, and its recorded cost equals its secret's byte length.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use fleetgate_api::{create_api_router, ApiConfig, AppState, CredentialValidator};
use fleetgate_core::{CredentialError, CredentialRecord};
use fleetgate_storage::DocumentStore;
use fleetgate_test_utils::fixtures::{api_key_header, seeded_store};
use fleetgate_test_utils::generators::{
    arb_credential_record, arb_hints_body, arb_malformed_body,
};
use fleetgate_test_utils::{CountingStore, RecordingCache, ENROLLMENT_KEYS_COLLECTION, HINTS_COLLECTION};
use proptest::prelude::*;
use serde_json::Value;
use tower::ServiceExt;

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

/// Records with unique identifiers, mixed active flags.
fn credential_set_strategy() -> impl Strategy<Value = Vec<CredentialRecord>> {
    prop::collection::vec(
        prop_oneof![arb_credential_record(true), arb_credential_record(false)],
        1..12,
    )
    .prop_map(|records| {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| seen.insert(r.api_key_id.clone()))
            .collect()
    })
}

/// Credential set plus a lookup order over its indices (with repeats).
fn lookup_plan_strategy() -> impl Strategy<Value = (Vec<CredentialRecord>, Vec<usize>)> {
    credential_set_strategy().prop_flat_map(|records| {
        let len = records.len();
        (Just(records), prop::collection::vec(0..len, 1..40))
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// **Property 1: Persisted hints mirror the request**
    #[test]
    fn prop_persisted_hints_mirror_request(
        body in arb_hints_body(),
        agent_id in "[a-z0-9-]{1,24}",
    ) {
        runtime().block_on(async {
            let store = Arc::new(CountingStore::default());
            let config = ApiConfig { credential_validation: false, ..ApiConfig::default() };
            let router = create_api_router(AppState::new(
                config,
                store.clone(),
                Arc::new(RecordingCache::new()),
            ));

            let request = Request::builder()
                .method("POST")
                .uri(format!("/api/fleet/agents/{}/hints", agent_id))
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap();
            let response = router.oneshot(request).await.unwrap();
            prop_assert_eq!(response.status(), StatusCode::OK);

            let stored = store.inner().read(HINTS_COLLECTION, &agent_id).await.unwrap();
            let stored: Value = serde_json::from_slice(&stored).unwrap();

            let mut expected = body.clone();
            expected["agentId"] = Value::String(agent_id.clone());
            prop_assert_eq!(stored, expected);
            Ok(())
        })?;
    }

    /// **Property 2: Malformed bodies never reach the store**
    #[test]
    fn prop_malformed_body_never_reaches_store(body in arb_malformed_body()) {
        runtime().block_on(async {
            let store = Arc::new(CountingStore::default());
            let calls = store.calls();
            let router = create_api_router(AppState::new(
                ApiConfig::default(),
                store,
                Arc::new(RecordingCache::new()),
            ));

            let request = Request::builder()
                .method("POST")
                .uri("/api/fleet/agents/agent-1/hints")
                .header("authorization", api_key_header("key-1", "secret"))
                .body(Body::from(body))
                .unwrap();
            let response = router.oneshot(request).await.unwrap();

            prop_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            prop_assert_eq!(calls.total(), 0);
            Ok(())
        })?;
    }

    /// **Property 3: Cache admission**
    #[test]
    fn prop_cache_admits_only_active_records((records, order) in lookup_plan_strategy()) {
        runtime().block_on(async {
            let store = Arc::new(CountingStore::new(seeded_store(&records).await));
            let calls = store.calls();
            let cache = Arc::new(RecordingCache::new());
            let validator =
                CredentialValidator::new(cache.clone(), store, ENROLLMENT_KEYS_COLLECTION);

            let mut active_looked_up = HashSet::new();
            let mut inactive_lookups = 0;
            for &index in &order {
                let record = &records[index];
                let result = validator.resolve(&record.api_key_id).await;
                if record.active {
                    prop_assert_eq!(result.as_ref().ok(), Some(record));
                    active_looked_up.insert(record.api_key_id.clone());
                } else {
                    let inactive = matches!(result, Err(CredentialError::Inactive { .. }));
                    prop_assert!(inactive);
                    prop_assert!(!cache.contains(&record.api_key_id));
                    inactive_lookups += 1;
                }
            }

            prop_assert_eq!(calls.queries(), active_looked_up.len() + inactive_lookups);

            let costs: HashMap<String, u64> = cache.sets().into_iter().collect();
            prop_assert_eq!(costs.len(), active_looked_up.len());
            for record in records.iter().filter(|r| costs.contains_key(&r.api_key_id)) {
                prop_assert!(record.active);
                prop_assert_eq!(costs[&record.api_key_id], record.api_key.expose().len() as u64);
            }
            Ok(())
        })?;
    }
}
