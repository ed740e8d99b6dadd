// Shared-secret gates for the internal dashboard API and the cron trigger

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{app::AppState, utils::service_error::ServiceError};

pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Constant-time comparison of a presented secret with the configured one
pub fn secret_matches(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(provided) => {
            provided.len() == expected.len()
                && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
        },
        None => false,
    }
}

/// Checks a header against an optional secret. No configured secret means open.
pub fn check_secret_header(
    expected: Option<&str>,
    headers: &axum::http::HeaderMap,
    header_name: &str,
) -> Result<(), ServiceError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let provided = headers.get(header_name).and_then(|v| v.to_str().ok());
    if secret_matches(expected, provided) {
        Ok(())
    } else {
        warn!("Rejected request with missing or wrong {}", header_name);
        Err(ServiceError::Unauthorized("Unauthorized".to_string()))
    }
}

/// Middleware for `/api/internal/*`
pub async fn internal_secret_middleware(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match check_secret_header(
        app_state.config.internal_api_secret.as_deref(),
        request.headers(),
        INTERNAL_SECRET_HEADER,
    ) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("s3cret", Some("s3cret")));
        assert!(!secret_matches("s3cret", Some("s3cre")));
        assert!(!secret_matches("s3cret", Some("S3cret")));
        assert!(!secret_matches("s3cret", None));
    }

    #[test]
    fn test_open_when_unconfigured() {
        assert!(check_secret_header(None, &HeaderMap::new(), CRON_SECRET_HEADER).is_ok());
    }

    #[test]
    fn test_header_checked_when_configured() {
        let mut headers = HeaderMap::new();
        assert!(check_secret_header(Some("abc"), &headers, CRON_SECRET_HEADER).is_err());

        headers.insert(CRON_SECRET_HEADER, HeaderValue::from_static("abc"));
        assert!(check_secret_header(Some("abc"), &headers, CRON_SECRET_HEADER).is_ok());
        assert!(check_secret_header(Some("abc"), &headers, INTERNAL_SECRET_HEADER).is_err());
    }
}
