// Sweep trigger for the external scheduler

use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    app::AppState,
    middleware::{check_secret_header, CRON_SECRET_HEADER},
    services::{SweepReport, SweepService},
    utils::service_error::ServiceError,
};

/// Run one nudge sweep across all projects
/// GET /api/cron/sweep
#[utoipa::path(
    get,
    path = "/api/cron/sweep",
    tag = "Cron",
    operation_id = "runSweep",
    params(
        ("x-cron-secret" = Option<String>, Header, description = "Required when CRON_SWEEP_SECRET is set")
    ),
    responses(
        (status = 200, description = "Sweep finished", body = SweepReport),
        (status = 401, description = "Missing or wrong cron secret"),
        (status = 500, description = "Email provider not configured or settings unreadable")
    )
)]
pub async fn run_sweep(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepReport>, ServiceError> {
    check_secret_header(
        state.config.cron_secret.as_deref(),
        &headers,
        CRON_SECRET_HEADER,
    )?;

    let report = SweepService::new(&state).run().await?;
    Ok(Json(report))
}
