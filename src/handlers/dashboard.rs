use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    app::AppState,
    services::{DashboardSummary, ProjectService},
    utils::{resolve_project_id, service_error::ServiceError, ProjectQuery},
};

/// Headline counts for the last 30 days
/// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    operation_id = "dashboardSummary",
    params(("projectId" = Option<String>, Query, description = "Defaults to DEFAULT_PROJECT_ID")),
    responses(
        (status = 200, description = "Summary counts", body = DashboardSummary),
        (status = 400, description = "Missing or invalid projectId")
    )
)]
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<DashboardSummary>, ServiceError> {
    let project_id = resolve_project_id(query.project_id.as_ref(), state.config.default_project_id)?;
    Ok(Json(ProjectService::new(&state).summary(project_id).await?))
}
