// OpenAPI document for the HTTP API

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    handlers::{cron, dashboard, events, projects, settings, webhooks},
    models::{ProjectBilling, TrialSettings},
    services::{
        ingestion::IngestEventRequest,
        project::{
            ApiKeyResponse, BootstrapProjectRequest, DashboardSummary, LastEventResponse,
            OwnerEmailRequest, OwnerEmailResponse, ProjectHandle, ResolveProjectRequest,
            SaveSettingsRequest, UpdateBillingRequest, UpdateSettingsRequest,
        },
        sweep::{ProjectSweepReport, SweepReport, SweepSkipReason},
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "apiKeyHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-trialrescue-api-key"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TrialRescue API",
        description = "Trial-user event ingestion, inactivity nudges and billing activation"
    ),
    paths(
        events::ingest_event,
        cron::run_sweep,
        webhooks::dodo_payments_webhook,
        projects::resolve_project,
        projects::bootstrap_project,
        projects::set_owner_email,
        settings::get_settings,
        settings::update_settings,
        settings::save_settings,
        settings::get_billing,
        settings::update_billing,
        settings::get_api_key,
        settings::get_last_event,
        dashboard::summary,
    ),
    components(schemas(
        IngestEventRequest,
        SweepReport,
        ProjectSweepReport,
        SweepSkipReason,
        ResolveProjectRequest,
        BootstrapProjectRequest,
        ProjectHandle,
        OwnerEmailRequest,
        OwnerEmailResponse,
        UpdateSettingsRequest,
        SaveSettingsRequest,
        UpdateBillingRequest,
        ApiKeyResponse,
        LastEventResponse,
        DashboardSummary,
        TrialSettings,
        ProjectBilling,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Events", description = "Trial lifecycle ingestion"),
        (name = "Cron", description = "Scheduled nudge sweep"),
        (name = "Webhooks", description = "Payment provider callbacks"),
        (name = "Internal", description = "Project provisioning for the dashboard"),
        (name = "Settings", description = "Per-project trial settings"),
        (name = "Billing", description = "Project billing state"),
        (name = "Dashboard", description = "Summary metrics")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification at /api/docs/openapi.json
pub async fn serve_openapi_spec() -> Response {
    match ApiDoc::openapi().to_json() {
        Ok(spec) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            spec,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize OpenAPI document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}
