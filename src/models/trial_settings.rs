// Per-project trial settings: branding and the three inactivity thresholds

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::trial_settings;

pub const DEFAULT_TRIAL_LENGTH_DAYS: i32 = 14;
pub const DEFAULT_NUDGE1_DAYS: i32 = 2;
pub const DEFAULT_NUDGE2_DAYS: i32 = 4;
pub const DEFAULT_NUDGE3_DAYS: i32 = 7;
pub const DEFAULT_APP_URL: &str = "https://your-saas-app.com";

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema,
)]
#[diesel(table_name = trial_settings)]
#[diesel(primary_key(project_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TrialSettings {
    pub project_id: Uuid,
    pub product_name: Option<String>,
    pub support_email: Option<String>,
    pub app_url: Option<String>,
    pub trial_length_days: i32,
    pub inactivity_days_nudge1: i32,
    pub inactivity_days_nudge2: i32,
    pub inactivity_days_nudge3: i32,
    pub automation_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = trial_settings)]
pub struct NewTrialSettings {
    pub project_id: Uuid,
    pub app_url: Option<String>,
    pub trial_length_days: i32,
    pub inactivity_days_nudge1: i32,
    pub inactivity_days_nudge2: i32,
    pub inactivity_days_nudge3: i32,
    pub automation_enabled: bool,
}

impl NewTrialSettings {
    pub fn defaults_for(project_id: Uuid) -> Self {
        Self {
            project_id,
            app_url: Some(DEFAULT_APP_URL.to_string()),
            trial_length_days: DEFAULT_TRIAL_LENGTH_DAYS,
            inactivity_days_nudge1: DEFAULT_NUDGE1_DAYS,
            inactivity_days_nudge2: DEFAULT_NUDGE2_DAYS,
            inactivity_days_nudge3: DEFAULT_NUDGE3_DAYS,
            automation_enabled: true,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = trial_settings)]
pub struct TrialSettingsChanges {
    pub product_name: Option<String>,
    pub support_email: Option<String>,
    pub app_url: Option<String>,
    pub trial_length_days: Option<i32>,
    pub inactivity_days_nudge1: Option<i32>,
    pub inactivity_days_nudge2: Option<i32>,
    pub inactivity_days_nudge3: Option<i32>,
    pub automation_enabled: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Thresholds in days, as used by the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NudgeThresholds {
    pub nudge1: i64,
    pub nudge2: i64,
    pub nudge3: i64,
}

impl TrialSettings {
    pub fn thresholds(&self) -> NudgeThresholds {
        NudgeThresholds {
            nudge1: self.inactivity_days_nudge1 as i64,
            nudge2: self.inactivity_days_nudge2 as i64,
            nudge3: self.inactivity_days_nudge3 as i64,
        }
    }

    pub async fn find_by_project(
        conn: &mut AsyncPgConnection,
        id: Uuid,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::trial_settings::dsl;

        dsl::trial_settings
            .find(id)
            .select(TrialSettings::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn load_all(conn: &mut AsyncPgConnection) -> Result<Vec<Self>, diesel::result::Error> {
        use crate::schema::trial_settings::dsl;

        dsl::trial_settings
            .order(dsl::created_at.asc())
            .select(TrialSettings::as_select())
            .load(conn)
            .await
    }

    /// Apply a partial update. Returns `None` when the project has no settings row.
    pub async fn update(
        conn: &mut AsyncPgConnection,
        id: Uuid,
        changes: &TrialSettingsChanges,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::trial_settings::dsl;

        diesel::update(dsl::trial_settings.find(id))
            .set(changes)
            .returning(TrialSettings::as_returning())
            .get_result(conn)
            .await
            .optional()
    }

    /// Full-form save from the settings page: insert or overwrite every field
    pub async fn upsert_full(
        conn: &mut AsyncPgConnection,
        values: &NewTrialSettings,
    ) -> Result<Self, diesel::result::Error> {
        use crate::schema::trial_settings::dsl;

        diesel::insert_into(dsl::trial_settings)
            .values(values)
            .on_conflict(dsl::project_id)
            .do_update()
            .set((
                dsl::app_url.eq(excluded(dsl::app_url)),
                dsl::trial_length_days.eq(excluded(dsl::trial_length_days)),
                dsl::inactivity_days_nudge1.eq(excluded(dsl::inactivity_days_nudge1)),
                dsl::inactivity_days_nudge2.eq(excluded(dsl::inactivity_days_nudge2)),
                dsl::inactivity_days_nudge3.eq(excluded(dsl::inactivity_days_nudge3)),
                dsl::automation_enabled.eq(excluded(dsl::automation_enabled)),
                dsl::updated_at.eq(Utc::now()),
            ))
            .returning(TrialSettings::as_returning())
            .get_result(conn)
            .await
    }
}
