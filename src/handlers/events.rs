// Public event ingestion endpoint

use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    app::AppState,
    middleware::ProjectApiKey,
    services::{ingestion::IngestEventRequest, IngestionService},
    utils::{parse_json_body, service_error::ServiceError},
};

/// Record a trial lifecycle event
/// POST /api/events
#[utoipa::path(
    post,
    path = "/api/events",
    tag = "Events",
    operation_id = "ingestEvent",
    request_body = IngestEventRequest,
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Malformed body or unknown event_type"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "User state could not be updated")
    ),
    security(
        ("bearerAuth" = []),
        ("apiKeyHeader" = [])
    )
)]
pub async fn ingest_event(
    State(state): State<AppState>,
    ProjectApiKey(api_key): ProjectApiKey,
    body: Bytes,
) -> Result<Json<Value>, ServiceError> {
    let service = IngestionService::new(&state);

    // Key is checked before the body so unauthenticated callers learn nothing else
    let project = service.authenticate(&api_key).await?;

    let request: IngestEventRequest = if body.is_empty() {
        IngestEventRequest::default()
    } else {
        parse_json_body(&body)?
    };
    let event = request.validate_event(Utc::now())?;

    let user = service.ingest(project.id, event).await?;
    info!(project_id = %project.id, user_id = %user.id, "Event ingested");

    Ok(Json(json!({ "ok": true })))
}
