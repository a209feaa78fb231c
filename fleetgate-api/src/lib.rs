//! FLEETGATE API - Agent Hints HTTP Layer
//!
//! Accepts per-agent hints documents over HTTP, validates the caller's
//! enrollment key through the cache-fronted [`CredentialValidator`], and
//! persists the document with immediate visibility through the store
//! gateway.

pub mod auth;
pub mod config;
pub mod error;
pub mod macros;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod validator;

// Re-export commonly used types
pub use auth::{extract_api_key, parse_api_key, ApiKeyCredentials};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::{build_cache, AppState};
pub use validator::CredentialValidator;
