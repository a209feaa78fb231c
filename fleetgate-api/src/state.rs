//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use fleetgate_storage::{
    CredentialCache, DocumentStore, MokaCredentialCache, NoopCredentialCache, StoreGateway,
};

use crate::config::ApiConfig;
use crate::telemetry::PrometheusStoreObserver;
use crate::validator::CredentialValidator;

/// Application-wide state shared across all routes.
///
/// Built once at startup; every request task holds a cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    /// Timeout-enforcing gateway in front of the document store.
    pub store: Arc<StoreGateway>,
    /// Credential cache, also held by `validator`.
    pub cache: Arc<dyn CredentialCache>,
    pub validator: Arc<CredentialValidator>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire state around `store`, wrapping it in a [`StoreGateway`] with the
    /// configured timeout and Prometheus observation.
    pub fn new(config: ApiConfig, store: Arc<dyn DocumentStore>, cache: Arc<dyn CredentialCache>) -> Self {
        let gateway = Arc::new(
            StoreGateway::new(store, config.store_timeout)
                .with_observer(Arc::new(PrometheusStoreObserver)),
        );
        let validator = Arc::new(CredentialValidator::new(
            cache.clone(),
            gateway.clone(),
            config.enrollment_keys_collection.clone(),
        ));

        Self {
            config: Arc::new(config),
            store: gateway,
            cache,
            validator,
            start_time: Instant::now(),
        }
    }

    /// Wire state with the cache described by `config`.
    pub fn with_configured_cache(config: ApiConfig, store: Arc<dyn DocumentStore>) -> Self {
        let cache = build_cache(&config);
        Self::new(config, store, cache)
    }
}

/// Build the credential cache selected by `config`.
pub fn build_cache(config: &ApiConfig) -> Arc<dyn CredentialCache> {
    match config.cache_config() {
        Some(cache_config) => Arc::new(MokaCredentialCache::new(cache_config)),
        None => Arc::new(NoopCredentialCache::new()),
    }
}

crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(Arc<StoreGateway>, store);
crate::impl_from_ref!(Arc<dyn CredentialCache>, cache);
crate::impl_from_ref!(Arc<CredentialValidator>, validator);
crate::impl_from_ref!(Instant, start_time);
