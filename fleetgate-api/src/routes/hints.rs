//! Agent hints route.
//!
//! `POST /api/fleet/agents/:id/hints` stores the request body as the hints
//! document of agent `id`. Each request moves through
//! `Received -> Decoded -> (Validated) -> Persisted -> Responded`; any step
//! may fail it instead, producing exactly one error response and one log
//! line.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use fleetgate_core::{HintsDocument, Visibility};
use fleetgate_storage::{DocumentStore, StoreGateway};
use serde::{Deserialize, Serialize};

use crate::auth::extract_api_key;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::middleware::request_id_of;
use crate::state::AppState;
use crate::telemetry::with_metrics;
use crate::validator::CredentialValidator;

/// Value of `action` for a stored hints document.
pub const ACTION_CREATED: &str = "created";

/// Success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintsResponse {
    pub action: String,
}

impl HintsResponse {
    pub fn created() -> Self {
        Self {
            action: ACTION_CREATED.to_string(),
        }
    }
}

/// POST /api/fleet/agents/:id/hints
///
/// Path and body rejections are taken as values so that they share the
/// error body and log line of every other failure.
pub async fn create_hints(
    State(config): State<Arc<ApiConfig>>,
    State(store): State<Arc<StoreGateway>>,
    State(validator): State<Arc<CredentialValidator>>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id_of(&headers);
    let agent_id = match &path {
        Ok(Path(id)) => id.clone(),
        Err(_) => String::new(),
    };

    let outcome = match extract_request(path, body) {
        Ok((agent_id, body)) => {
            process(&config, &store, &validator, &agent_id, &headers, &body).await
        }
        Err(e) => Err(e),
    }
    .and_then(|resp| {
        serde_json::to_vec(&resp)
            .map_err(|e| ApiError::serialization_failed(format!("encode hints response: {}", e)))
    });
    let duration_ns = start.elapsed().as_nanos() as u64;

    match outcome {
        Ok(data) => {
            with_metrics(|m| m.record_body_out(data.len()));
            tracing::info!(
                request_id = %request_id,
                "mod" = "hints",
                agent_id = %agent_id,
                status_code = StatusCode::OK.as_u16(),
                duration_ns,
                "Hints created"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                data,
            )
                .into_response()
        }
        Err(err) => {
            let status_code = err.status_code().as_u16();
            if err.is_server_error() {
                tracing::error!(
                    request_id = %request_id,
                    "mod" = "hints",
                    agent_id = %agent_id,
                    status_code,
                    duration_ns,
                    error = %err,
                    "Hints request failed"
                );
            } else {
                tracing::warn!(
                    request_id = %request_id,
                    "mod" = "hints",
                    agent_id = %agent_id,
                    status_code,
                    duration_ns,
                    error = %err,
                    "Hints request failed"
                );
            }
            err.into_response()
        }
    }
}

fn extract_request(
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<(String, Bytes)> {
    let Path(agent_id) =
        path.map_err(|e| ApiError::decode_request(format!("agent id: {}", e.body_text())))?;
    let body = body.map_err(|e| {
        let code = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ErrorCode::PayloadTooLarge
        } else {
            ErrorCode::DecodeRequest
        };
        ApiError::new(code, format!("read hints request: {}", e.body_text()))
    })?;
    Ok((agent_id, body))
}

async fn process(
    config: &ApiConfig,
    store: &StoreGateway,
    validator: &CredentialValidator,
    agent_id: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> ApiResult<HintsResponse> {
    with_metrics(|m| m.record_body_in(body.len()));
    let document = HintsDocument::from_slice(body)
        .map_err(|e| ApiError::decode_request(format!("decode hints request: {}", e)))?;

    if config.credential_validation {
        let credentials = extract_api_key(headers)?;
        let record = validator.resolve(&credentials.id).await?;
        tracing::debug!(api_key_id = record.identifier(), "Enrollment key validated");
    }

    let payload = document
        .tagged(agent_id)
        .to_vec()
        .map_err(|e| ApiError::serialization_failed(format!("encode hints document: {}", e)))?;

    store
        .create(
            &config.hints_collection,
            agent_id,
            &payload,
            Visibility::Immediate,
        )
        .await?;

    Ok(HintsResponse::created())
}

/// Create the hints router.
pub fn create_router() -> Router<AppState> {
    Router::new().route("/agents/:id/hints", post(create_hints))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_response_body() {
        let json = serde_json::to_string(&HintsResponse::created()).unwrap();
        assert_eq!(json, r#"{"action":"created"}"#);
    }
}
