// HTTP handlers and their route builders

pub mod cron;
pub mod dashboard;
pub mod docs;
pub mod events;
pub mod projects;
pub mod settings;
pub mod webhooks;

use crate::{
    app::AppState,
    middleware::{events_cors_middleware, internal_secret_middleware},
    utils::service_error::ServiceError,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Anything but POST on a POST-only endpoint
pub async fn method_not_allowed() -> ServiceError {
    ServiceError::MethodNotAllowed
}

// Public ingestion route, open to any origin
pub fn events_routes() -> Router<AppState> {
    Router::new()
        .route("/api/events", post(events::ingest_event))
        .layer(middleware::from_fn(events_cors_middleware))
}

// Scheduler and payment provider callbacks; each checks its own secret
pub fn callback_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cron/sweep", get(cron::run_sweep))
        .route(
            "/api/webhooks/dodopayments",
            post(webhooks::dodo_payments_webhook).get(method_not_allowed),
        )
}

// Dashboard-facing routes, gated by the internal secret when one is configured
pub fn internal_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/internal/resolve-project", post(projects::resolve_project))
        .route(
            "/api/internal/bootstrap-project",
            post(projects::bootstrap_project),
        )
        .route(
            "/api/internal/project/owner-email",
            post(projects::set_owner_email).get(method_not_allowed),
        )
        .route(
            "/api/internal/project/settings",
            get(settings::get_settings).patch(settings::update_settings),
        )
        .route(
            "/api/internal/project/billing",
            get(settings::get_billing).patch(settings::update_billing),
        )
        .route("/api/internal/project/api-key", get(settings::get_api_key))
        .route(
            "/api/internal/project/last-event",
            get(settings::get_last_event),
        )
        .route(
            "/api/project/settings",
            get(settings::get_settings)
                .put(settings::save_settings)
                .post(settings::save_settings),
        )
        .route("/api/dashboard/summary", get(dashboard::summary))
        .route_layer(middleware::from_fn_with_state(
            state,
            internal_secret_middleware,
        ))
}

pub fn docs_routes() -> Router<AppState> {
    Router::new().route("/api/docs/openapi.json", get(docs::serve_openapi_spec))
}
