//! FLEETGATE Server Entry Point
//!
//! Bootstraps configuration and telemetry, selects the document store,
//! builds the credential cache, and starts the Axum HTTP server.

use std::sync::Arc;

use fleetgate_api::telemetry::{init_tracing, TelemetryConfig};
use fleetgate_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use fleetgate_storage::{DocumentStore, HttpDocumentStore, InMemoryDocumentStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(&TelemetryConfig::default())?;

    let config = ApiConfig::from_env();
    let store = build_store(&config)?;
    let state = AppState::with_configured_cache(config.clone(), store);
    let app = create_api_router(state);

    let addr = config.bind_addr()?;
    tracing::info!(
        %addr,
        credential_validation = config.credential_validation,
        cache_max_bytes = config.cache_max_bytes,
        cache_ttl_secs = config.cache_ttl.map(|t| t.as_secs()),
        "Starting FLEETGATE server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

fn build_store(config: &ApiConfig) -> ApiResult<Arc<dyn DocumentStore>> {
    match config.http_store_config() {
        Some(http_config) => {
            tracing::info!(base_url = %http_config.base_url, "Using REST document store");
            Ok(Arc::new(HttpDocumentStore::new(&http_config)?))
        }
        None => {
            tracing::warn!("FLEETGATE_STORE_URL unset, using in-memory document store");
            let store = Arc::new(InMemoryDocumentStore::new());
            let _ = store.spawn_refresher(config.refresh_interval);
            Ok(store)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
