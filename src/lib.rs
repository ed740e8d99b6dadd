// Library exports for TrialRescue
// This file exposes modules and functions for the binary and integration tests

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::DieselPool;
pub use services::{
    BillingService, EmailService, IngestionService, ProjectService, SweepReport, SweepService,
};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the shared application state: config, database pool, migrations and mailer
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    // Load environment
    dotenv::dotenv().ok();

    // Initialize config
    let config = app_config::config();

    // Initialize database pool
    info!(
        "Initializing database pool ({})...",
        db::mask_connection_string(&config.database_url)
    );
    let db_config = db::DieselDatabaseConfig::from_config(config);
    let max_connections = db_config.max_connections;
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    // Run migrations if enabled
    if migrations::should_run_migrations(config) {
        info!("Running embedded migrations...");
        migrations::run_all_migrations(migrations::MigrationConfig::from_config(config))
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    let email_service = Arc::new(EmailService::new(config.email.clone())?);
    if !email_service.is_configured() {
        tracing::warn!("RESEND_API_KEY not set; the nudge sweep will refuse to run");
    }

    Ok(AppState {
        config: Arc::new(config.clone()),
        diesel_pool,
        email_service,
        max_connections,
    })
}

/// Assemble every route group into one router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(handlers::events_routes())
        .merge(handlers::callback_routes())
        .merge(
            handlers::internal_routes(state.clone())
                .layer(middleware::dashboard_cors_layer(&state.config)),
        )
        .route("/health", get(health_check));

    if state.config.enable_api_docs {
        router = router.merge(handlers::docs_routes());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

// Health check handler
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();

    // Check PostgreSQL
    let (postgres_healthy, postgres_health) = match db::check_diesel_health(&state.diesel_pool).await
    {
        Ok(_) => (
            true,
            serde_json::json!({
                "status": "healthy",
                "max_connections": state.max_connections,
                "error": null
            }),
        ),
        Err(e) => (
            false,
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            }),
        ),
    };

    let response = serde_json::json!({
        "status": if postgres_healthy { "healthy" } else { "degraded" },
        "service": "trial-rescue",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health,
            "email": {
                "status": if state.email_service.is_configured() { "configured" } else { "not_configured" }
            }
        }
    });

    if postgres_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
