//! API Configuration Module
//!
//! Configuration is loaded from `FLEETGATE_*` environment variables with
//! defaults suitable for local development: an in-memory store, validation
//! on, and a small credential cache.

use std::net::SocketAddr;
use std::time::Duration;

use fleetgate_core::{ENROLLMENT_KEYS_COLLECTION, HINTS_COLLECTION};
use fleetgate_storage::store::gateway::DEFAULT_STORE_TIMEOUT;
use fleetgate_storage::{CacheConfig, HttpStoreConfig};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // Listener
    // ========================================================================
    /// Host to bind.
    pub bind_host: String,

    /// Port to bind.
    pub port: u16,

    /// Whole-request deadline. Requests past it are dropped, aborting any
    /// in-flight store call.
    pub request_timeout: Duration,

    // ========================================================================
    // Document store
    // ========================================================================
    /// Base URL of the REST document store. `None` selects the in-memory store.
    pub store_url: Option<String>,

    /// Bearer token presented to the REST document store.
    pub store_service_token: Option<SecretString>,

    /// Per-call store timeout enforced by the gateway.
    pub store_timeout: Duration,

    /// How often the in-memory store publishes deferred writes.
    pub refresh_interval: Duration,

    /// Collection receiving hints documents.
    pub hints_collection: String,

    /// Collection holding enrollment key records.
    pub enrollment_keys_collection: String,

    // ========================================================================
    // Credential validation
    // ========================================================================
    /// Whether the hints route validates the caller's enrollment key.
    pub credential_validation: bool,

    /// Total cost budget of the credential cache in bytes. 0 disables caching.
    pub cache_max_bytes: u64,

    /// Credential cache time-to-live. `None` accepts unbounded staleness.
    pub cache_ttl: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8220,
            request_timeout: Duration::from_secs(30),

            store_url: None,
            store_service_token: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            refresh_interval: Duration::from_secs(1),
            hints_collection: HINTS_COLLECTION.to_string(),
            enrollment_keys_collection: ENROLLMENT_KEYS_COLLECTION.to_string(),

            credential_validation: true,
            cache_max_bytes: cache.max_cost,
            cache_ttl: cache.time_to_live,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `FLEETGATE_API_BIND`: Host to bind (default: 0.0.0.0)
    /// - `FLEETGATE_API_PORT` or `PORT`: Port to bind (default: 8220)
    /// - `FLEETGATE_REQUEST_TIMEOUT_SECS`: Whole-request deadline (default: 30)
    /// - `FLEETGATE_STORE_URL`: REST document store base URL (default: in-memory)
    /// - `FLEETGATE_STORE_TOKEN`: Bearer token for the REST store
    /// - `FLEETGATE_STORE_TIMEOUT_MS`: Per-call store timeout (default: 5000)
    /// - `FLEETGATE_REFRESH_INTERVAL_MS`: In-memory store refresh period (default: 1000)
    /// - `FLEETGATE_HINTS_COLLECTION`: Hints collection (default: .fleet-hints)
    /// - `FLEETGATE_ENROLLMENT_KEYS_COLLECTION`: Enrollment key collection
    ///   (default: .fleet-enrollment-api-keys)
    /// - `FLEETGATE_CREDENTIAL_VALIDATION`: "true" or "false" (default: true)
    /// - `FLEETGATE_CACHE_MAX_BYTES`: Credential cache budget, 0 disables (default: 1048576)
    /// - `FLEETGATE_CACHE_TTL_SECS`: Credential cache TTL, 0 disables expiry (default: 300)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Unparseable values fall back to their defaults, as do zero durations
    /// (a zero timeout or refresh period cannot serve any request).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_u64 = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };
        let nonzero_u64 = |key: &str, default: u64| -> u64 {
            match parse_u64(key, default) {
                0 => default,
                value => value,
            }
        };
        let non_empty = |key: &str| -> Option<String> {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let port = lookup("FLEETGATE_API_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);

        let credential_validation = lookup("FLEETGATE_CREDENTIAL_VALIDATION")
            .map(|s| s.trim().to_lowercase() != "false")
            .unwrap_or(defaults.credential_validation);

        let cache_ttl = match lookup("FLEETGATE_CACHE_TTL_SECS").and_then(|s| s.trim().parse().ok()) {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.cache_ttl,
        };

        Self {
            bind_host: non_empty("FLEETGATE_API_BIND").unwrap_or(defaults.bind_host),
            port,
            request_timeout: Duration::from_secs(nonzero_u64(
                "FLEETGATE_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),

            store_url: non_empty("FLEETGATE_STORE_URL"),
            store_service_token: non_empty("FLEETGATE_STORE_TOKEN").map(SecretString::from),
            store_timeout: Duration::from_millis(nonzero_u64(
                "FLEETGATE_STORE_TIMEOUT_MS",
                defaults.store_timeout.as_millis() as u64,
            )),
            refresh_interval: Duration::from_millis(nonzero_u64(
                "FLEETGATE_REFRESH_INTERVAL_MS",
                defaults.refresh_interval.as_millis() as u64,
            )),
            hints_collection: non_empty("FLEETGATE_HINTS_COLLECTION")
                .unwrap_or(defaults.hints_collection),
            enrollment_keys_collection: non_empty("FLEETGATE_ENROLLMENT_KEYS_COLLECTION")
                .unwrap_or(defaults.enrollment_keys_collection),

            credential_validation,
            cache_max_bytes: parse_u64("FLEETGATE_CACHE_MAX_BYTES", defaults.cache_max_bytes),
            cache_ttl,
        }
    }

    /// Resolve the listen address.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_config(format!("Invalid bind address {}: {}", addr, e)))
    }

    /// Credential cache settings, or `None` when caching is disabled.
    pub fn cache_config(&self) -> Option<CacheConfig> {
        if self.cache_max_bytes == 0 {
            return None;
        }
        let config = CacheConfig::new().with_max_cost(self.cache_max_bytes);
        Some(match self.cache_ttl {
            Some(ttl) => config.with_ttl(ttl),
            None => config.without_ttl(),
        })
    }

    /// REST store settings, or `None` for the in-memory store.
    pub fn http_store_config(&self) -> Option<HttpStoreConfig> {
        let url = self.store_url.as_ref()?;
        let config = HttpStoreConfig::new(url.clone()).with_request_timeout(self.store_timeout);
        Some(match &self.store_service_token {
            Some(token) => config.with_service_token(token.expose_secret()),
            None => config,
        })
    }
}
