// Internal provisioning endpoints called by the dashboard front-end

use axum::{body::Bytes, extract::State, Json};
use tracing::info;

use crate::{
    app::AppState,
    services::{
        project::{
            BootstrapProjectRequest, OwnerEmailRequest, OwnerEmailResponse, ProjectHandle,
            ResolveProjectRequest,
        },
        ProjectService,
    },
    utils::{parse_json_body, service_error::ServiceError},
};

/// Resolve (or provision) the dashboard user's project
/// POST /api/internal/resolve-project
#[utoipa::path(
    post,
    path = "/api/internal/resolve-project",
    tag = "Internal",
    operation_id = "resolveProject",
    request_body = ResolveProjectRequest,
    responses(
        (status = 200, description = "Existing or newly created project", body = ProjectHandle),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or wrong internal secret")
    )
)]
pub async fn resolve_project(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ProjectHandle>, ServiceError> {
    let request: ResolveProjectRequest = parse_json_body(&body)?;
    let handle = ProjectService::new(&state)
        .resolve_for_user(request.user_id)
        .await?;
    Ok(Json(handle))
}

/// Create an additional named project
/// POST /api/internal/bootstrap-project
#[utoipa::path(
    post,
    path = "/api/internal/bootstrap-project",
    tag = "Internal",
    operation_id = "bootstrapProject",
    request_body = BootstrapProjectRequest,
    responses(
        (status = 200, description = "Project created", body = ProjectHandle),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or wrong internal secret")
    )
)]
pub async fn bootstrap_project(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ProjectHandle>, ServiceError> {
    let request: BootstrapProjectRequest = parse_json_body(&body)?;
    let handle = ProjectService::new(&state).bootstrap(request).await?;
    info!(project_id = %handle.project_id, "Project bootstrapped");
    Ok(Json(handle))
}

/// Record the billing email of a project, once
/// POST /api/internal/project/owner-email
#[utoipa::path(
    post,
    path = "/api/internal/project/owner-email",
    tag = "Internal",
    operation_id = "setOwnerEmail",
    request_body = OwnerEmailRequest,
    responses(
        (status = 200, description = "Email stored or already present", body = OwnerEmailResponse),
        (status = 400, description = "Missing project_id or email"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn set_owner_email(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OwnerEmailResponse>, ServiceError> {
    let request: OwnerEmailRequest = if body.is_empty() {
        OwnerEmailRequest::default()
    } else {
        parse_json_body(&body)?
    };
    let response = ProjectService::new(&state).set_owner_email(request).await?;
    Ok(Json(response))
}
