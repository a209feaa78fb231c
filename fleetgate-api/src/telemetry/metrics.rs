//! Prometheus Metrics Definitions
//!
//! Defines all FLEETGATE metrics with their labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse};
use fleetgate_storage::StoreObserver;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, Encoder,
    HistogramVec, IntCounter, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// Store operation latency buckets (seconds)
const STORE_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<FleetMetrics>> = Lazy::new(FleetMetrics::new);

/// Container for all FLEETGATE metrics.
#[derive(Clone)]
pub struct FleetMetrics {
    /// HTTP request counter - labels: method, route, status
    pub http_requests_total: CounterVec,

    /// Bytes read from hints request bodies
    pub hints_body_in_bytes_total: IntCounter,

    /// Bytes written in hints response bodies
    pub hints_body_out_bytes_total: IntCounter,

    /// Store call duration histogram - labels: operation, outcome
    pub store_operation_duration_seconds: HistogramVec,

    /// Credential cache lookups - labels: result (hit/miss)
    pub credential_cache_lookups_total: CounterVec,
}

impl FleetMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "fleetgate_http_requests_total",
                "Total number of HTTP requests",
                &["method", "route", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            hints_body_in_bytes_total: register_int_counter!(
                "fleetgate_hints_body_in_bytes_total",
                "Bytes read from hints request bodies"
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register hints_body_in_bytes_total: {}", e)))?,

            hints_body_out_bytes_total: register_int_counter!(
                "fleetgate_hints_body_out_bytes_total",
                "Bytes written in hints response bodies"
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register hints_body_out_bytes_total: {}", e)))?,

            store_operation_duration_seconds: register_histogram_vec!(
                "fleetgate_store_operation_duration_seconds",
                "Document store call duration in seconds",
                &["operation", "outcome"],
                STORE_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register store_operation_duration_seconds: {}", e)))?,

            credential_cache_lookups_total: register_counter_vec!(
                "fleetgate_credential_cache_lookups_total",
                "Credential cache lookups by result",
                &["result"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register credential_cache_lookups_total: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, route: &str, status: u16) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, route, &status_str])
            .inc();
    }

    /// Record a hints request body size.
    pub fn record_body_in(&self, bytes: usize) {
        self.hints_body_in_bytes_total.inc_by(bytes as u64);
    }

    /// Record a hints response body size.
    pub fn record_body_out(&self, bytes: usize) {
        self.hints_body_out_bytes_total.inc_by(bytes as u64);
    }

    /// Record a document store call.
    pub fn record_store_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.store_operation_duration_seconds
            .with_label_values(&[operation, outcome])
            .observe(duration_secs);
    }

    /// Record a credential cache lookup.
    pub fn record_cache_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.credential_cache_lookups_total
            .with_label_values(&[result])
            .inc();
    }
}

/// Run `f` against the global metrics, if they registered.
pub fn with_metrics<F: FnOnce(&FleetMetrics)>(f: F) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// [`StoreObserver`] feeding store call latencies into Prometheus.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusStoreObserver;

impl StoreObserver for PrometheusStoreObserver {
    fn observe(&self, operation: &'static str, outcome: &'static str, elapsed: Duration) {
        with_metrics(|m| m.record_store_operation(operation, outcome, elapsed.as_secs_f64()));
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the registry so the fleetgate families exist before the first request.
    let _ = METRICS.as_ref();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
