// Project (tenant) model and its billing state

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::trial_settings::{NewTrialSettings, TrialSettings};
use crate::schema::projects;

/// Name given to projects provisioned automatically on first dashboard visit
pub const DEFAULT_PROJECT_NAME: &str = "My SaaS";

/// Billing status enumeration. Only `Active` projects are swept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BillingStatus {
    Inactive,
    Active,
    Cancelled,
}

impl BillingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Inactive => "inactive",
            BillingStatus::Active => "active",
            BillingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "inactive" => Some(BillingStatus::Inactive),
            "active" => Some(BillingStatus::Active),
            "cancelled" => Some(BillingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub api_key: String,
    pub owner_user_id: Option<Uuid>,
    pub owner_email: Option<String>,
    pub billing_status: String,
    pub billing_plan: Option<String>,
    pub billing_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub id: Uuid,
    pub name: String,
    pub api_key: String,
    pub owner_user_id: Option<Uuid>,
    pub owner_email: Option<String>,
    pub billing_status: String,
    pub created_at: DateTime<Utc>,
}

impl NewProject {
    pub fn new(name: &str, owner_user_id: Option<Uuid>, owner_email: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            api_key: generate_api_key(),
            owner_user_id,
            owner_email,
            billing_status: BillingStatus::Inactive.as_str().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Billing fields written by the payment webhook or a manual override
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = projects)]
pub struct BillingUpdate {
    pub billing_status: Option<String>,
    pub billing_plan: Option<String>,
    pub billing_updated_at: DateTime<Utc>,
}

/// Billing view served to the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, ToSchema)]
pub struct ProjectBilling {
    pub id: Uuid,
    pub billing_status: String,
    pub billing_plan: Option<String>,
    pub billing_updated_at: Option<DateTime<Utc>>,
}

/// `tr_` followed by 24 hex characters
pub fn generate_api_key() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("tr_{}", &raw[..24])
}

impl Project {
    pub fn is_billing_active(&self) -> bool {
        self.billing_status == BillingStatus::Active.as_str()
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        project_id: Uuid,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::projects::dsl;

        dsl::projects
            .find(project_id)
            .select(Project::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn find_by_api_key(
        conn: &mut AsyncPgConnection,
        key: &str,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::projects::dsl;

        dsl::projects
            .filter(dsl::api_key.eq(key))
            .select(Project::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Oldest project owned by a dashboard user
    pub async fn find_first_by_owner(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::projects::dsl;

        dsl::projects
            .filter(dsl::owner_user_id.eq(owner))
            .order(dsl::created_at.asc())
            .select(Project::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Newest project registered under a billing email
    pub async fn find_latest_by_owner_email(
        conn: &mut AsyncPgConnection,
        email: &str,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::projects::dsl;

        dsl::projects
            .filter(dsl::owner_email.eq(email))
            .order(dsl::created_at.desc())
            .select(Project::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Insert a project together with its default trial settings
    pub async fn create_with_defaults(
        conn: &mut AsyncPgConnection,
        new_project: NewProject,
    ) -> Result<(Self, TrialSettings), diesel::result::Error> {
        conn.transaction::<_, diesel::result::Error, _>(|tx| {
            async move {
                let project = diesel::insert_into(projects::table)
                    .values(&new_project)
                    .returning(Project::as_returning())
                    .get_result(tx)
                    .await?;

                let settings = diesel::insert_into(crate::schema::trial_settings::table)
                    .values(&NewTrialSettings::defaults_for(project.id))
                    .returning(TrialSettings::as_returning())
                    .get_result(tx)
                    .await?;

                Ok((project, settings))
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn billing(
        conn: &mut AsyncPgConnection,
        project_id: Uuid,
    ) -> Result<Option<ProjectBilling>, diesel::result::Error> {
        use crate::schema::projects::dsl;

        dsl::projects
            .find(project_id)
            .select((
                dsl::id,
                dsl::billing_status,
                dsl::billing_plan,
                dsl::billing_updated_at,
            ))
            .first::<ProjectBilling>(conn)
            .await
            .optional()
    }

    pub async fn update_billing(
        conn: &mut AsyncPgConnection,
        project_id: Uuid,
        update: &BillingUpdate,
    ) -> Result<Option<ProjectBilling>, diesel::result::Error> {
        use crate::schema::projects::dsl;

        diesel::update(dsl::projects.find(project_id))
            .set(update)
            .returning((
                dsl::id,
                dsl::billing_status,
                dsl::billing_plan,
                dsl::billing_updated_at,
            ))
            .get_result::<ProjectBilling>(conn)
            .await
            .optional()
    }

    /// Returns true if the email was written, false if one was already set
    pub async fn set_owner_email_if_unset(
        conn: &mut AsyncPgConnection,
        project_id: Uuid,
        email: &str,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::projects::dsl;

        let updated = diesel::update(
            dsl::projects
                .find(project_id)
                .filter(dsl::owner_email.is_null()),
        )
        .set(dsl::owner_email.eq(email))
        .execute(conn)
        .await?;

        Ok(updated > 0)
    }
}
