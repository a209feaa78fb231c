//! FLEETGATE Telemetry - Observability Infrastructure
//!
//! Structured JSON logging through `tracing` and Prometheus metrics for the
//! HTTP layer and the document store gateway.

pub mod metrics;
pub mod middleware;
pub mod subscriber;

pub use metrics::{metrics_handler, with_metrics, FleetMetrics, PrometheusStoreObserver, METRICS};
pub use middleware::observability_middleware;
pub use subscriber::{init_tracing, TelemetryConfig};
