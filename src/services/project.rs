// Project provisioning and the dashboard's settings/billing/API-key views

use chrono::{DateTime, Duration, Utc};
use diesel_async::AsyncPgConnection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        project::DEFAULT_PROJECT_NAME, BillingStatus, EmailLog, NewProject, NewTrialSettings, Project,
        ProjectUser, TrialSettings, TrialSettingsChanges,
    },
    utils::{service_error::ServiceError, validation::trim_optional_field},
};

/// Window used by the dashboard summary
pub const SUMMARY_WINDOW_DAYS: i64 = 30;

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ResolveProjectRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct BootstrapProjectRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "project_name must not be empty"))]
    pub project_name: String,
    #[validate(email(message = "Invalid owner_email"))]
    pub owner_email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct OwnerEmailRequest {
    pub project_id: Option<String>,
    pub email: Option<String>,
}

/// Partial settings update; omitted fields are left as they are
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateSettingsRequest {
    pub project_id: Option<Uuid>,
    #[validate(length(max = 200))]
    pub product_name: Option<String>,
    #[validate(email(message = "Invalid support_email"))]
    pub support_email: Option<String>,
    #[validate(url(message = "Invalid app_url"))]
    pub app_url: Option<String>,
    #[validate(range(min = 1, max = 365))]
    pub trial_length_days: Option<i32>,
    #[validate(range(min = 1, max = 365))]
    pub inactivity_days_nudge1: Option<i32>,
    #[validate(range(min = 1, max = 365))]
    pub inactivity_days_nudge2: Option<i32>,
    #[validate(range(min = 1, max = 365))]
    pub inactivity_days_nudge3: Option<i32>,
    pub automation_enabled: Option<bool>,
}

impl UpdateSettingsRequest {
    fn into_changes(self) -> TrialSettingsChanges {
        TrialSettingsChanges {
            product_name: self.product_name,
            support_email: self.support_email,
            app_url: self.app_url,
            trial_length_days: self.trial_length_days,
            inactivity_days_nudge1: self.inactivity_days_nudge1,
            inactivity_days_nudge2: self.inactivity_days_nudge2,
            inactivity_days_nudge3: self.inactivity_days_nudge3,
            automation_enabled: self.automation_enabled,
            updated_at: Some(Utc::now()),
        }
    }
}

/// Full settings form; every field is required
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct SaveSettingsRequest {
    #[validate(url(message = "Invalid app_url"))]
    pub app_url: String,
    #[validate(range(min = 1, max = 365))]
    pub trial_length_days: i32,
    #[validate(range(min = 1, max = 365))]
    pub inactivity_days_nudge1: i32,
    #[validate(range(min = 1, max = 365))]
    pub inactivity_days_nudge2: i32,
    #[validate(range(min = 1, max = 365))]
    pub inactivity_days_nudge3: i32,
    pub automation_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateBillingRequest {
    pub project_id: Option<Uuid>,
    /// `inactive`, `active` or `cancelled`
    pub billing_status: Option<String>,
    pub billing_plan: Option<String>,
}

/// Column width of `projects.billing_plan`
pub const MAX_BILLING_PLAN_LEN: usize = 100;

/// Trimmed billing fields, at least one of them present
#[derive(Debug, Clone, PartialEq)]
pub struct BillingOverride {
    pub billing_status: Option<BillingStatus>,
    pub billing_plan: Option<String>,
}

impl UpdateBillingRequest {
    pub fn validate_override(&self) -> Result<BillingOverride, ServiceError> {
        let status = trim_optional_field(self.billing_status.as_ref());
        let plan = trim_optional_field(self.billing_plan.as_ref());
        if status.is_none() && plan.is_none() {
            return Err(ServiceError::ValidationError(
                "Missing billing_status or billing_plan".to_string(),
            ));
        }

        let billing_status = match status {
            Some(raw) => Some(BillingStatus::from_string(&raw).ok_or_else(|| {
                ServiceError::ValidationError("Invalid billing_status".to_string())
            })?),
            None => None,
        };

        if plan
            .as_ref()
            .is_some_and(|p| p.chars().count() > MAX_BILLING_PLAN_LEN)
        {
            return Err(ServiceError::ValidationError(
                "Invalid billing_plan".to_string(),
            ));
        }

        Ok(BillingOverride {
            billing_status,
            billing_plan: plan,
        })
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectHandle {
    pub project_id: Uuid,
    pub name: String,
    pub api_key: String,
}

impl From<Project> for ProjectHandle {
    fn from(project: Project) -> Self {
        Self {
            project_id: project.id,
            name: project.name,
            api_key: project.api_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OwnerEmailResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_set: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LastEventResponse {
    pub last_event_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub trials_last_30: usize,
    pub nudged_users: usize,
    pub upgrades_from_rescued: usize,
}

/// Counts for the dashboard. `trials` are users whose trial started in the
/// window; an upgrade counts as rescued when some nudge went out at or before it.
pub fn summarize(trials: &[ProjectUser], logs: &[EmailLog]) -> DashboardSummary {
    let nudged: HashSet<Uuid> = logs.iter().map(|log| log.user_id).collect();

    let mut first_sent: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for log in logs {
        first_sent
            .entry(log.user_id)
            .and_modify(|at| *at = (*at).min(log.sent_at))
            .or_insert(log.sent_at);
    }

    let upgrades_from_rescued = trials
        .iter()
        .filter(|user| match (user.upgraded_at, first_sent.get(&user.id)) {
            (Some(upgraded), Some(sent)) => *sent <= upgraded,
            _ => false,
        })
        .count();

    DashboardSummary {
        trials_last_30: trials.len(),
        nudged_users: nudged.len(),
        upgrades_from_rescued,
    }
}

// =============================================================================
// PROJECT SERVICE
// =============================================================================

pub struct ProjectService {
    diesel_pool: DieselPool,
}

impl ProjectService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    async fn require_project(
        conn: &mut AsyncPgConnection,
        project_id: Uuid,
    ) -> Result<Project, ServiceError> {
        Project::find_by_id(conn, project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Project not found".to_string()))
    }

    /// Oldest project of the user, provisioning a default one on first visit
    #[instrument(skip(self))]
    pub async fn resolve_for_user(&self, user_id: Uuid) -> Result<ProjectHandle, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        if let Some(existing) = Project::find_first_by_owner(&mut conn, user_id).await? {
            return Ok(existing.into());
        }

        let (project, _) = Project::create_with_defaults(
            &mut conn,
            NewProject::new(DEFAULT_PROJECT_NAME, Some(user_id), None),
        )
        .await?;

        info!(project_id = %project.id, "Provisioned default project for user");
        Ok(project.into())
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn bootstrap(
        &self,
        request: BootstrapProjectRequest,
    ) -> Result<ProjectHandle, ServiceError> {
        request.validate()?;

        let name = request.project_name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "project_name must not be empty".to_string(),
            ));
        }

        let mut conn = self.diesel_pool.get().await?;
        let (project, _) = Project::create_with_defaults(
            &mut conn,
            NewProject::new(
                name,
                Some(request.user_id),
                trim_optional_field(request.owner_email.as_ref()),
            ),
        )
        .await?;

        info!(project_id = %project.id, "Bootstrapped project");
        Ok(project.into())
    }

    /// Record the billing email once; later calls leave it alone
    #[instrument(skip(self, request))]
    pub async fn set_owner_email(
        &self,
        request: OwnerEmailRequest,
    ) -> Result<OwnerEmailResponse, ServiceError> {
        let missing = || ServiceError::ValidationError("Missing project_id or email".to_string());
        let raw_id = trim_optional_field(request.project_id.as_ref()).ok_or_else(missing)?;
        let email = trim_optional_field(request.email.as_ref()).ok_or_else(missing)?;

        let project_id = Uuid::parse_str(&raw_id)
            .map_err(|_| ServiceError::ValidationError("Invalid project_id".to_string()))?;

        let mut conn = self.diesel_pool.get().await?;
        let project = Self::require_project(&mut conn, project_id).await?;

        if project.owner_email.is_some() {
            return Ok(OwnerEmailResponse {
                ok: true,
                already_set: Some(true),
                updated: None,
            });
        }

        let updated = Project::set_owner_email_if_unset(&mut conn, project_id, &email).await?;
        if !updated {
            // Another request set it in between
            return Ok(OwnerEmailResponse {
                ok: true,
                already_set: Some(true),
                updated: None,
            });
        }

        Ok(OwnerEmailResponse {
            ok: true,
            already_set: None,
            updated: Some(true),
        })
    }

    pub async fn settings(&self, project_id: Uuid) -> Result<TrialSettings, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        TrialSettings::find_by_project(&mut conn, project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Settings not found".to_string()))
    }

    #[instrument(skip(self, request))]
    pub async fn update_settings(
        &self,
        project_id: Uuid,
        request: UpdateSettingsRequest,
    ) -> Result<TrialSettings, ServiceError> {
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;
        TrialSettings::update(&mut conn, project_id, &request.into_changes())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Settings not found".to_string()))
    }

    #[instrument(skip(self, request))]
    pub async fn save_settings(
        &self,
        project_id: Uuid,
        request: SaveSettingsRequest,
    ) -> Result<TrialSettings, ServiceError> {
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;
        Self::require_project(&mut conn, project_id).await?;

        let values = NewTrialSettings {
            project_id,
            app_url: Some(request.app_url),
            trial_length_days: request.trial_length_days,
            inactivity_days_nudge1: request.inactivity_days_nudge1,
            inactivity_days_nudge2: request.inactivity_days_nudge2,
            inactivity_days_nudge3: request.inactivity_days_nudge3,
            automation_enabled: request.automation_enabled,
        };

        Ok(TrialSettings::upsert_full(&mut conn, &values).await?)
    }

    pub async fn api_key(&self, project_id: Uuid) -> Result<ApiKeyResponse, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let project = Self::require_project(&mut conn, project_id).await?;

        Ok(ApiKeyResponse {
            api_key: project.api_key,
        })
    }

    /// Latest lifecycle timestamp across all of the project's users
    #[instrument(skip(self))]
    pub async fn last_event(&self, project_id: Uuid) -> Result<LastEventResponse, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let users = ProjectUser::load_for_project(&mut conn, project_id).await?;

        Ok(LastEventResponse {
            last_event_at: users.iter().filter_map(ProjectUser::latest_event_at).max(),
        })
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, project_id: Uuid) -> Result<DashboardSummary, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        let since = Utc::now() - Duration::days(SUMMARY_WINDOW_DAYS);
        let trials = ProjectUser::load_trials_since(&mut conn, project_id, since).await?;
        let logs = EmailLog::logs_for_project(&mut conn, project_id).await?;

        Ok(summarize(&trials, &logs))
    }
}
