//! Axum Middleware for HTTP Request Metrics
//!
//! Counts every request by method, matched route template and status.
//! Route templates keep label cardinality bounded; unmatched paths share one
//! label.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use super::metrics::with_metrics;

/// Label used for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let response = next.run(request).await;

    with_metrics(|m| m.record_http_request(method.as_str(), &route, response.status().as_u16()));
    response
}
