//! REST API Routes Module
//!
//! - `/api/fleet/agents/:id/hints` - agent hints ingestion
//! - `/health/*` - health checks (Kubernetes-compatible)
//! - `/metrics` - Prometheus scrape endpoint

pub mod health;
pub mod hints;

use axum::{error_handling::HandleErrorLayer, middleware::from_fn, routing::get, BoxError, Router};
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ErrorCode};
use crate::middleware::request_id_layers;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use health::create_router as health_router;
pub use hints::create_router as hints_router;

/// Build the complete router.
///
/// # Middleware Order (outer to inner)
/// 1. Request id - assigns `X-Request-ID` and echoes it on the response
/// 2. Trace - one span per request
/// 3. Timeout - drops the request future after `request_timeout` and answers
///    with a `REQUEST_TIMEOUT` error body
/// 4. Observability (per route) - request counters by route template
pub fn create_api_router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;
    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .nest("/api/fleet", hints::create_router())
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .layer(from_fn(observability_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id)
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id)
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

/// Convert errors raised by the tower stack into API errors.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request exceeded the whole-request deadline");
        ApiError::from_code(ErrorCode::RequestTimeout)
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ApiError::internal_error(format!("middleware failure: {}", err))
    }
}
