//! REST document store adapter.
//!
//! Speaks the Elasticsearch document API subset the service needs:
//!
//! | Operation | Request                                          |
//! |-----------|--------------------------------------------------|
//! | create    | `PUT /{collection}/_doc/{key}?refresh=<directive>` |
//! | read      | `GET /{collection}/_doc/{key}`                   |
//! | query     | `POST /{collection}/_search` (term filters, size 1) |
//!
//! Transport failures are classified as [`StoreError::Unavailable`]; server
//! rejections of writes as [`StoreError::Write`] or [`StoreError::Conflict`].

use std::time::Duration;

use async_trait::async_trait;
use fleetgate_core::{ConfigError, Predicate, StoreError, StoreResult, Visibility, WriteReceipt};
use reqwest::{header::CONTENT_TYPE, RequestBuilder, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use super::DocumentStore;

/// Longest server error body written to the log.
const MAX_ERROR_BODY: usize = 256;

/// Connection settings for [`HttpDocumentStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the store, e.g. `http://localhost:9200`.
    pub base_url: String,
    /// Bearer token sent with every request, if set.
    pub service_token: Option<SecretString>,
    /// Client-level request timeout. The gateway applies its own, usually
    /// tighter, per-call timeout on top.
    pub request_timeout: Duration,
}

impl HttpStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_token: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_service_token(mut self, token: impl Into<String>) -> Self {
        self.service_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct WriteAck {
    #[serde(rename = "_version")]
    version: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: Value,
}

/// [`DocumentStore`] backed by a REST document store.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: Url,
    service_token: Option<SecretString>,
}

fn transport(operation: &str, err: reqwest::Error) -> StoreError {
    StoreError::unavailable(operation, err.to_string())
}

fn encode_source(collection: &str, source: &Value) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(source).map_err(|e| StoreError::Serialization {
        context: format!("encode document from {}", collection),
        reason: e.to_string(),
    })
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Log the body of a rejected request. Store error bodies never reach callers.
async fn log_rejection(operation: &str, collection: &str, response: reqwest::Response) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        operation,
        collection,
        status,
        body = truncate(&body),
        "Document store rejected request"
    );
}

/// Build the query body for a term-filter search returning one hit.
fn search_body(predicate: &Predicate) -> Value {
    let filter: Vec<Value> = predicate
        .terms()
        .iter()
        .map(|(field, value)| json!({ "term": { field: value } }))
        .collect();
    json!({
        "size": 1,
        "query": { "bool": { "filter": filter } }
    })
}

impl HttpDocumentStore {
    pub fn new(config: &HttpStoreConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "store_url".to_string(),
            value: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "store_url".to_string(),
                value: config.base_url.clone(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "store_url".to_string(),
                value: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            service_token: config.service_token.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can always carry path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.service_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Classify a non-success response for a read-side operation.
    async fn read_failure(
        operation: &str,
        collection: &str,
        response: reqwest::Response,
    ) -> StoreError {
        let status = response.status();
        log_rejection(operation, collection, response).await;
        let reason = format!("status {}", status.as_u16());
        if status.is_server_error() {
            StoreError::unavailable(operation, reason)
        } else {
            StoreError::Query {
                collection: collection.to_string(),
                reason: format!("{}: {}", operation, reason),
            }
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create(
        &self,
        collection: &str,
        key: &str,
        payload: &[u8],
        visibility: Visibility,
    ) -> StoreResult<WriteReceipt> {
        let mut url = self.url(&[collection, "_doc", key]);
        url.query_pairs_mut()
            .append_pair("refresh", visibility.refresh_param());

        let response = self
            .authorize(self.client.put(url))
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| transport("create", e))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            log_rejection("create", collection, response).await;
            return Err(StoreError::Write {
                collection: collection.to_string(),
                key: key.to_string(),
                reason: format!("status {}", status.as_u16()),
            });
        }

        // The write already succeeded; an unreadable acknowledgement only loses the version.
        let version = response
            .json::<WriteAck>()
            .await
            .ok()
            .and_then(|ack| ack.version)
            .unwrap_or(1);

        Ok(WriteReceipt {
            collection: collection.to_string(),
            key: key.to_string(),
            version,
            visibility,
        })
    }

    async fn read(&self, collection: &str, key: &str) -> StoreResult<Vec<u8>> {
        let url = self.url(&[collection, "_doc", key]);
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| transport("read", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, key));
        }
        if !response.status().is_success() {
            return Err(Self::read_failure("read", collection, response).await);
        }

        let doc: GetResponse = response.json().await.map_err(|e| StoreError::Serialization {
            context: format!("decode read response from {}", collection),
            reason: e.to_string(),
        })?;
        match doc.source {
            Some(source) if doc.found => encode_source(collection, &source),
            _ => Err(StoreError::not_found(collection, key)),
        }
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> StoreResult<Vec<u8>> {
        let url = self.url(&[collection, "_search"]);
        let response = self
            .authorize(self.client.post(url))
            .json(&search_body(predicate))
            .send()
            .await
            .map_err(|e| transport("query", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, predicate.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::read_failure("query", collection, response).await);
        }

        let result: SearchResponse = response.json().await.map_err(|e| StoreError::Query {
            collection: collection.to_string(),
            reason: format!("malformed search response: {}", e),
        })?;
        match result.hits.hits.into_iter().next() {
            Some(hit) => encode_source(collection, &hit.source),
            None => Err(StoreError::not_found(collection, predicate.to_string())),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        let response = self
            .authorize(self.client.get(self.base_url.clone()))
            .send()
            .await
            .map_err(|e| transport("ping", e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::unavailable(
                "ping",
                format!("status {}", response.status().as_u16()),
            ))
        }
    }
}
