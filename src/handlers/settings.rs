// Dashboard CRUD: trial settings, billing, API key and last event

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    app::AppState,
    models::{ProjectBilling, TrialSettings},
    services::{
        project::{
            ApiKeyResponse, LastEventResponse, SaveSettingsRequest, UpdateBillingRequest,
            UpdateSettingsRequest,
        },
        BillingService, ProjectService,
    },
    utils::{parse_json_body, resolve_project_id, service_error::ServiceError, ProjectQuery},
};

fn project_from_query(state: &AppState, query: &ProjectQuery) -> Result<Uuid, ServiceError> {
    resolve_project_id(query.project_id.as_ref(), state.config.default_project_id)
}

/// Body id first, then `?projectId=`, then the configured default
fn project_from_body_or_query(
    state: &AppState,
    body_id: Option<Uuid>,
    query: &ProjectQuery,
) -> Result<Uuid, ServiceError> {
    match body_id {
        Some(id) => Ok(id),
        None => project_from_query(state, query),
    }
}

/// GET /api/internal/project/settings
#[utoipa::path(
    get,
    path = "/api/internal/project/settings",
    tag = "Settings",
    operation_id = "getSettings",
    params(("projectId" = Option<String>, Query, description = "Defaults to DEFAULT_PROJECT_ID")),
    responses(
        (status = 200, description = "Trial settings", body = TrialSettings),
        (status = 400, description = "Missing or invalid projectId"),
        (status = 404, description = "Settings not found")
    )
)]
pub async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<TrialSettings>, ServiceError> {
    let project_id = project_from_query(&state, &query)?;
    Ok(Json(ProjectService::new(&state).settings(project_id).await?))
}

/// PATCH /api/internal/project/settings
#[utoipa::path(
    patch,
    path = "/api/internal/project/settings",
    tag = "Settings",
    operation_id = "updateSettings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = TrialSettings),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Settings not found")
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
    body: Bytes,
) -> Result<Json<TrialSettings>, ServiceError> {
    let request: UpdateSettingsRequest = parse_json_body(&body)?;
    let project_id = project_from_body_or_query(&state, request.project_id, &query)?;

    let settings = ProjectService::new(&state)
        .update_settings(project_id, request)
        .await?;
    Ok(Json(settings))
}

/// Full-form save from the settings page
/// PUT /api/project/settings
#[utoipa::path(
    put,
    path = "/api/project/settings",
    tag = "Settings",
    operation_id = "saveSettings",
    params(("projectId" = Option<String>, Query, description = "Defaults to DEFAULT_PROJECT_ID")),
    request_body = SaveSettingsRequest,
    responses(
        (status = 200, description = "Saved"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn save_settings(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
    body: Bytes,
) -> Result<Json<Value>, ServiceError> {
    let project_id = project_from_query(&state, &query)?;
    let request: SaveSettingsRequest = parse_json_body(&body)?;

    ProjectService::new(&state)
        .save_settings(project_id, request)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// GET /api/internal/project/billing
#[utoipa::path(
    get,
    path = "/api/internal/project/billing",
    tag = "Billing",
    operation_id = "getBilling",
    params(("projectId" = Option<String>, Query, description = "Defaults to DEFAULT_PROJECT_ID")),
    responses(
        (status = 200, description = "Billing state", body = ProjectBilling),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_billing(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ProjectBilling>, ServiceError> {
    let project_id = project_from_query(&state, &query)?;
    Ok(Json(BillingService::new(&state).billing(project_id).await?))
}

/// Manual billing override
/// PATCH /api/internal/project/billing
#[utoipa::path(
    patch,
    path = "/api/internal/project/billing",
    tag = "Billing",
    operation_id = "updateBilling",
    request_body = UpdateBillingRequest,
    responses(
        (status = 200, description = "Updated billing state", body = ProjectBilling),
        (status = 400, description = "Nothing to update or invalid value"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn update_billing(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
    body: Bytes,
) -> Result<Json<ProjectBilling>, ServiceError> {
    let request: UpdateBillingRequest = parse_json_body(&body)?;
    let project_id = project_from_body_or_query(&state, request.project_id, &query)?;

    let billing = BillingService::new(&state)
        .override_billing(project_id, &request)
        .await?;
    Ok(Json(billing))
}

/// GET /api/internal/project/api-key
#[utoipa::path(
    get,
    path = "/api/internal/project/api-key",
    tag = "Settings",
    operation_id = "getApiKey",
    params(("projectId" = Option<String>, Query, description = "Defaults to DEFAULT_PROJECT_ID")),
    responses(
        (status = 200, description = "Project API key", body = ApiKeyResponse),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_api_key(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ApiKeyResponse>, ServiceError> {
    let project_id = project_from_query(&state, &query)?;
    Ok(Json(ProjectService::new(&state).api_key(project_id).await?))
}

/// GET /api/internal/project/last-event
#[utoipa::path(
    get,
    path = "/api/internal/project/last-event",
    tag = "Settings",
    operation_id = "getLastEvent",
    params(("projectId" = Option<String>, Query, description = "Defaults to DEFAULT_PROJECT_ID")),
    responses(
        (status = 200, description = "Latest event time or null", body = LastEventResponse)
    )
)]
pub async fn get_last_event(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<LastEventResponse>, ServiceError> {
    let project_id = project_from_query(&state, &query)?;
    Ok(Json(ProjectService::new(&state).last_event(project_id).await?))
}
