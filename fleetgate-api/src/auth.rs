//! Enrollment API key extraction.
//!
//! Agents present `Authorization: ApiKey <base64(id:secret)>`. Only the
//! identifier is used for validation; the secret is carried redacted.

use axum::http::{header, HeaderMap};
use base64::Engine;
use fleetgate_core::SecretKey;

use crate::error::{ApiError, ApiResult};

/// Authorization scheme for enrollment API keys.
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Decoded `ApiKey` credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKeyCredentials {
    pub id: String,
    pub secret: SecretKey,
}

/// Extract credentials from the `Authorization` header.
pub fn extract_api_key(headers: &HeaderMap) -> ApiResult<ApiKeyCredentials> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Authorization header is not valid ASCII"))?;

    parse_api_key(value)
}

/// Parse an `ApiKey <base64(id:secret)>` header value.
///
/// The scheme is matched case-insensitively.
pub fn parse_api_key(value: &str) -> ApiResult<ApiKeyCredentials> {
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| ApiError::unauthorized("Malformed Authorization header"))?;

    if !scheme.eq_ignore_ascii_case(API_KEY_SCHEME) {
        return Err(ApiError::unauthorized(format!(
            "Unsupported authorization scheme, expected {}",
            API_KEY_SCHEME
        )));
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(token.trim())
        .map_err(|_| ApiError::unauthorized("API key is not valid base64"))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| ApiError::unauthorized("API key is not valid UTF-8"))?;

    let (id, secret) = decoded
        .split_once(':')
        .ok_or_else(|| ApiError::unauthorized("API key must be id:secret"))?;
    if id.is_empty() {
        return Err(ApiError::unauthorized("API key id is empty"));
    }

    Ok(ApiKeyCredentials {
        id: id.to_string(),
        secret: SecretKey::new(secret),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::HeaderValue;

    fn encode(raw: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(raw)
    }

    #[test]
    fn test_parse_valid_api_key() {
        let creds = parse_api_key(&format!("ApiKey {}", encode("key-123:s3cr3t"))).unwrap();
        assert_eq!(creds.id, "key-123");
        assert_eq!(creds.secret.expose(), "s3cr3t");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let creds = parse_api_key(&format!("apikey {}", encode("k:s"))).unwrap();
        assert_eq!(creds.id, "k");
    }

    #[test]
    fn test_secret_may_contain_colons() {
        let creds = parse_api_key(&format!("ApiKey {}", encode("k:a:b"))).unwrap();
        assert_eq!(creds.secret.expose(), "a:b");
    }

    #[test]
    fn test_rejects_malformed_values() {
        for value in [
            "".to_string(),
            "ApiKey".to_string(),
            format!("Bearer {}", encode("k:s")),
            "ApiKey !!!not-base64!!!".to_string(),
            format!("ApiKey {}", encode("no-separator")),
            format!("ApiKey {}", encode(":secret-only")),
        ] {
            let err = parse_api_key(&value).unwrap_err();
            assert_eq!(err.code, ErrorCode::Unauthorized, "value {:?}", value);
        }
    }

    #[test]
    fn test_extract_requires_header() {
        let err = extract_api_key(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("ApiKey {}", encode("k:s"))).unwrap(),
        );
        assert_eq!(extract_api_key(&headers).unwrap().id, "k");
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let creds = parse_api_key(&format!("ApiKey {}", encode("k:topsecret"))).unwrap();
        assert!(!format!("{:?}", creds).contains("topsecret"));
    }
}
