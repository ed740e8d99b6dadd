// Project API key extraction for the public ingestion endpoint

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{app::AppState, utils::service_error::ServiceError};

/// Fallback header for clients that cannot set `Authorization`
pub const API_KEY_HEADER: &str = "x-trialrescue-api-key";

/// Raw API key presented by the caller. Not yet checked against the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectApiKey(pub String);

/// `Authorization: Bearer` wins; the custom header is read only without one
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        let token = bearer.token().trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl FromRequestParts<AppState> for ProjectApiKey {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        extract_api_key(&parts.headers)
            .map(ProjectApiKey)
            .ok_or_else(|| ServiceError::Unauthorized("Missing API key".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        let map = headers(&[("authorization", "Bearer tr_abc123")]);
        assert_eq!(extract_api_key(&map).as_deref(), Some("tr_abc123"));
    }

    #[test]
    fn test_custom_header_fallback() {
        let map = headers(&[(API_KEY_HEADER, "tr_fallback")]);
        assert_eq!(extract_api_key(&map).as_deref(), Some("tr_fallback"));
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let map = headers(&[
            ("authorization", "Bearer tr_bearer"),
            (API_KEY_HEADER, "tr_custom"),
        ]);
        assert_eq!(extract_api_key(&map).as_deref(), Some("tr_bearer"));
    }

    #[test]
    fn test_missing_or_malformed() {
        assert_eq!(extract_api_key(&HeaderMap::new()), None);
        assert_eq!(
            extract_api_key(&headers(&[("authorization", "Basic dXNlcjpwYXNz")])),
            None
        );
        assert_eq!(extract_api_key(&headers(&[(API_KEY_HEADER, "  ")])), None);
    }
}
