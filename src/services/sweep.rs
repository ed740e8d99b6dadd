// Nudge sweep: find inactive trial users and email them the most urgent nudge
// they have not received yet. Triggered externally, runs inside the request.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        EmailLog, NewEmailLog, NudgeKind, NudgeThresholds, Project, ProjectUser, SentNudges,
        TrialSettings,
    },
    services::email::EmailService,
    utils::service_error::ServiceError,
};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Why a project produced no sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SweepSkipReason {
    BillingLookupError,
    BillingInactive,
    AutomationDisabled,
    UserLoadError,
    NoUsers,
    LogLoadError,
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProjectSweepReport {
    pub project_id: Uuid,
    pub sent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SweepSkipReason>,
}

impl ProjectSweepReport {
    fn skipped(project_id: Uuid, reason: SweepSkipReason) -> Self {
        Self {
            project_id,
            sent: 0,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SweepReport {
    pub ok: bool,
    pub total_sent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_project: Option<Vec<ProjectSweepReport>>,
}

impl SweepReport {
    fn no_projects() -> Self {
        Self {
            ok: true,
            total_sent: 0,
            reason: Some("no projects with settings".to_string()),
            per_project: None,
        }
    }
}

/// A user selected for a nudge in this sweep
#[derive(Debug, Clone, PartialEq)]
pub struct NudgeCandidate {
    pub user_id: Uuid,
    pub email: String,
    pub kind: NudgeKind,
}

/// Whole days elapsed, floored
pub fn days_inactive(now: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    (now - reference).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

fn threshold_for(thresholds: &NudgeThresholds, kind: NudgeKind) -> i64 {
    match kind {
        NudgeKind::Nudge1 => thresholds.nudge1,
        NudgeKind::Nudge2 => thresholds.nudge2,
        NudgeKind::Nudge3 => thresholds.nudge3,
    }
}

/// The most urgent kind whose threshold is met and which was not sent before
pub fn select_nudge(
    user: &ProjectUser,
    thresholds: &NudgeThresholds,
    already_sent: Option<&HashSet<NudgeKind>>,
    now: DateTime<Utc>,
) -> Option<NudgeKind> {
    if user.email.as_deref().map_or(true, |e| e.trim().is_empty())
        || user.unsubscribed
        || user.upgraded_at.is_some()
    {
        return None;
    }

    let idle_days = days_inactive(now, user.activity_reference()?);

    NudgeKind::BY_URGENCY.into_iter().find(|kind| {
        idle_days >= threshold_for(thresholds, *kind)
            && !already_sent.is_some_and(|sent| sent.contains(kind))
    })
}

pub fn select_candidates(
    users: &[ProjectUser],
    thresholds: &NudgeThresholds,
    sent: &SentNudges,
    now: DateTime<Utc>,
) -> Vec<NudgeCandidate> {
    users
        .iter()
        .filter_map(|user| {
            let kind = select_nudge(user, thresholds, sent.get(&user.id), now)?;
            Some(NudgeCandidate {
                user_id: user.id,
                email: user.email.clone()?,
                kind,
            })
        })
        .collect()
}

pub struct SweepService {
    diesel_pool: DieselPool,
    email_service: Arc<EmailService>,
}

impl SweepService {
    pub fn new(state: &AppState) -> Self {
        Self::with_parts(state.diesel_pool.clone(), state.email_service.clone())
    }

    pub fn with_parts(diesel_pool: DieselPool, email_service: Arc<EmailService>) -> Self {
        Self {
            diesel_pool,
            email_service,
        }
    }

    /// Sweep every project that has settings, sequentially
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<SweepReport, ServiceError> {
        if !self.email_service.is_configured() {
            error!("Sweep requested but Resend is not configured");
            return Err(ServiceError::ConfigurationError(
                "Resend not configured".to_string(),
            ));
        }

        let mut conn = self.diesel_pool.get().await?;

        let settings_rows = TrialSettings::load_all(&mut conn).await.map_err(|e| {
            error!("Sweep: error loading trial settings: {}", e);
            ServiceError::from(e)
        })?;

        if settings_rows.is_empty() {
            return Ok(SweepReport::no_projects());
        }

        let now = Utc::now();
        let mut total_sent = 0;
        let mut per_project = Vec::with_capacity(settings_rows.len());

        for settings in &settings_rows {
            let report = self.sweep_project(&mut conn, settings, now).await;
            total_sent += report.sent;
            per_project.push(report);
        }

        info!(total_sent, projects = per_project.len(), "Sweep finished");

        Ok(SweepReport {
            ok: true,
            total_sent,
            reason: None,
            per_project: Some(per_project),
        })
    }

    #[instrument(skip(self, conn, settings, now), fields(project_id = %settings.project_id))]
    async fn sweep_project(
        &self,
        conn: &mut diesel_async::AsyncPgConnection,
        settings: &TrialSettings,
        now: DateTime<Utc>,
    ) -> ProjectSweepReport {
        let project_id = settings.project_id;

        match Project::find_by_id(conn, project_id).await {
            Err(e) => {
                error!("Sweep: error loading project billing: {}", e);
                return ProjectSweepReport::skipped(project_id, SweepSkipReason::BillingLookupError);
            },
            Ok(Some(project)) if project.is_billing_active() => {},
            Ok(_) => {
                return ProjectSweepReport::skipped(project_id, SweepSkipReason::BillingInactive);
            },
        }

        if !settings.automation_enabled {
            return ProjectSweepReport::skipped(project_id, SweepSkipReason::AutomationDisabled);
        }

        let users = match ProjectUser::load_for_project(conn, project_id).await {
            Ok(users) if users.is_empty() => {
                return ProjectSweepReport::skipped(project_id, SweepSkipReason::NoUsers);
            },
            Ok(users) => users,
            Err(e) => {
                error!("Sweep: error loading project users: {}", e);
                return ProjectSweepReport::skipped(project_id, SweepSkipReason::UserLoadError);
            },
        };

        let sent = match EmailLog::sent_kinds_for_project(conn, project_id).await {
            Ok(sent) => sent,
            Err(e) => {
                error!("Sweep: error loading email logs: {}", e);
                return ProjectSweepReport::skipped(project_id, SweepSkipReason::LogLoadError);
            },
        };

        let candidates = select_candidates(&users, &settings.thresholds(), &sent, now);
        if candidates.is_empty() {
            return ProjectSweepReport::skipped(project_id, SweepSkipReason::NoCandidates);
        }

        let branding = self.email_service.branding(
            settings.product_name.as_deref(),
            settings.support_email.as_deref(),
            settings.app_url.as_deref(),
        );

        let mut sent_for_project = 0;
        for candidate in candidates {
            let message_id = match self
                .email_service
                .send_nudge(&candidate.email, candidate.kind, &branding)
                .await
            {
                Ok(id) => id,
                Err(e) => {
                    warn!(user_id = %candidate.user_id, "Sweep: error sending {}: {}", candidate.kind, e);
                    continue;
                },
            };

            let log = NewEmailLog::new(project_id, candidate.user_id, candidate.kind, message_id);
            match EmailLog::insert(conn, &log).await {
                Ok(()) => {
                    debug!(user_id = %candidate.user_id, kind = %candidate.kind, "Nudge logged");
                    sent_for_project += 1;
                },
                Err(e) => {
                    error!(user_id = %candidate.user_id, "Sweep: error logging {}: {}", candidate.kind, e);
                },
            }
        }

        ProjectSweepReport {
            project_id,
            sent: sent_for_project,
            reason: None,
        }
    }
}
