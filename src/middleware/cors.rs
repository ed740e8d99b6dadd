use axum::{
    body::Body,
    http::{
        header::{self, HeaderValue},
        Method, Request, Response, StatusCode,
    },
    middleware::Next,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::debug;

use crate::app_config::AppConfig;

const EVENTS_ALLOW_METHODS: &str = "POST, OPTIONS";
const EVENTS_ALLOW_HEADERS: &str = "Content-Type, Authorization, x-trialrescue-api-key";

fn apply_events_cors(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(EVENTS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(EVENTS_ALLOW_HEADERS),
    );
}

/// CORS for the ingestion endpoint: any origin, no credentials.
/// Error responses carry the headers too so browsers can read them.
pub async fn events_cors_middleware(
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        debug!("CORS: answering events preflight");
        let mut response = Response::new(Body::from("{}"));
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        apply_events_cors(response.headers_mut());
        *response.status_mut() = StatusCode::OK;
        return Ok(response);
    }

    let mut response = next.run(req).await;
    apply_events_cors(response.headers_mut());
    Ok(response)
}

/// CORS for the dashboard API, from `CORS_ALLOWED_ORIGINS`
pub fn dashboard_cors_layer(config: &AppConfig) -> CorsLayer {
    let has_wildcard = config.cors_allowed_origins.iter().any(|o| o == "*");

    let origins = if has_wildcard && !config.is_production() {
        AllowOrigin::mirror_request()
    } else {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter(|o| o.as_str() != "*")
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
