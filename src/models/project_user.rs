// End-users of a tenant's product, tracked for trial lifecycle purposes

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::event::EventKind;
use crate::schema::project_users;

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema,
)]
#[diesel(table_name = project_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectUser {
    pub id: Uuid,
    pub project_id: Uuid,
    pub external_user_id: String,
    pub email: Option<String>,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub upgraded_at: Option<DateTime<Utc>>,
    pub unsubscribed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_users)]
struct NewProjectUser<'a> {
    id: Uuid,
    project_id: Uuid,
    external_user_id: &'a str,
    unsubscribed: bool,
}

/// Fields an incoming event writes; `None` leaves the column as is
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = project_users)]
pub struct ProjectUserChanges {
    pub email: Option<String>,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub upgraded_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectUserChanges {
    /// Lifecycle rules:
    /// - signup sets `trial_started_at` once and refreshes `last_activity_at`
    /// - activity refreshes `last_activity_at`
    /// - upgrade sets `upgraded_at` once
    ///
    /// `last_activity_at` only moves forward; a late event older than the
    /// stored value leaves it alone.
    pub fn for_event(
        current: &ProjectUser,
        kind: EventKind,
        email: Option<&str>,
        at: DateTime<Utc>,
    ) -> Self {
        let mut changes = ProjectUserChanges {
            email: email.map(str::to_string),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };

        let advances_activity = current.last_activity_at.map_or(true, |last| at > last);

        match kind {
            EventKind::SignedUp => {
                if current.trial_started_at.is_none() {
                    changes.trial_started_at = Some(at);
                }
                if advances_activity {
                    changes.last_activity_at = Some(at);
                }
            },
            EventKind::Activity => {
                if advances_activity {
                    changes.last_activity_at = Some(at);
                }
            },
            EventKind::Upgraded => {
                if current.upgraded_at.is_none() {
                    changes.upgraded_at = Some(at);
                }
            },
        }

        changes
    }
}

impl ProjectUser {
    /// Upsert the user keyed by (project, external id) and apply one event to it
    pub async fn apply_event(
        conn: &mut AsyncPgConnection,
        project: Uuid,
        external_id: &str,
        kind: EventKind,
        email: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Self, diesel::result::Error> {
        conn.transaction::<_, diesel::result::Error, _>(|tx| {
            async move {
                use crate::schema::project_users::dsl;

                diesel::insert_into(dsl::project_users)
                    .values(&NewProjectUser {
                        id: Uuid::new_v4(),
                        project_id: project,
                        external_user_id: external_id,
                        unsubscribed: false,
                    })
                    .on_conflict((dsl::project_id, dsl::external_user_id))
                    .do_nothing()
                    .execute(tx)
                    .await?;

                let current = dsl::project_users
                    .filter(dsl::project_id.eq(project))
                    .filter(dsl::external_user_id.eq(external_id))
                    .select(ProjectUser::as_select())
                    .for_update()
                    .first(tx)
                    .await?;

                let changes = ProjectUserChanges::for_event(&current, kind, email, at);

                diesel::update(dsl::project_users.find(current.id))
                    .set(&changes)
                    .returning(ProjectUser::as_returning())
                    .get_result(tx)
                    .await
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn load_for_project(
        conn: &mut AsyncPgConnection,
        project: Uuid,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        use crate::schema::project_users::dsl;

        dsl::project_users
            .filter(dsl::project_id.eq(project))
            .order(dsl::created_at.asc())
            .select(ProjectUser::as_select())
            .load(conn)
            .await
    }

    /// Users whose trial started at or after `since`
    pub async fn load_trials_since(
        conn: &mut AsyncPgConnection,
        project: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        use crate::schema::project_users::dsl;

        dsl::project_users
            .filter(dsl::project_id.eq(project))
            .filter(dsl::trial_started_at.ge(since))
            .select(ProjectUser::as_select())
            .load(conn)
            .await
    }

    /// Latest lifecycle timestamp recorded on this user
    pub fn latest_event_at(&self) -> Option<DateTime<Utc>> {
        [self.trial_started_at, self.last_activity_at, self.upgraded_at]
            .into_iter()
            .flatten()
            .max()
    }

    /// The moment inactivity is measured from
    pub fn activity_reference(&self) -> Option<DateTime<Utc>> {
        self.last_activity_at.or(self.trial_started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn user() -> ProjectUser {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        ProjectUser {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            external_user_id: "u_1".to_string(),
            email: None,
            trial_started_at: None,
            last_activity_at: None,
            upgraded_at: None,
            unsubscribed: false,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_signup_sets_trial_start_on_fresh_user() {
        let at = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        let changes =
            ProjectUserChanges::for_event(&user(), EventKind::SignedUp, Some("a@b.co"), at);

        assert_eq!(changes.trial_started_at, Some(at));
        assert_eq!(changes.last_activity_at, Some(at));
        assert_eq!(changes.email.as_deref(), Some("a@b.co"));
        assert!(changes.upgraded_at.is_none());
    }

    #[test]
    fn test_signup_replay_keeps_trial_start() {
        let first = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        let mut existing = user();
        existing.trial_started_at = Some(first);
        existing.last_activity_at = Some(first);

        let replay = first + Duration::days(3);
        let changes = ProjectUserChanges::for_event(&existing, EventKind::SignedUp, None, replay);

        assert!(changes.trial_started_at.is_none());
        assert_eq!(changes.last_activity_at, Some(replay));
        assert!(changes.email.is_none());
    }

    #[test]
    fn test_activity_only_touches_last_activity() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let changes = ProjectUserChanges::for_event(&user(), EventKind::Activity, None, at);

        assert_eq!(changes.last_activity_at, Some(at));
        assert!(changes.trial_started_at.is_none());
        assert!(changes.upgraded_at.is_none());
    }

    #[test]
    fn test_late_activity_does_not_rewind() {
        let latest = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let mut existing = user();
        existing.trial_started_at = Some(latest - Duration::days(5));
        existing.last_activity_at = Some(latest);

        let late = latest - Duration::days(10);
        let activity = ProjectUserChanges::for_event(&existing, EventKind::Activity, None, late);
        assert!(activity.last_activity_at.is_none());

        let signup = ProjectUserChanges::for_event(&existing, EventKind::SignedUp, None, late);
        assert!(signup.last_activity_at.is_none());
        assert!(signup.trial_started_at.is_none());

        // Same instant is not an advance either
        let same = ProjectUserChanges::for_event(&existing, EventKind::Activity, None, latest);
        assert!(same.last_activity_at.is_none());
    }

    #[test]
    fn test_upgrade_is_terminal() {
        let first = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let fresh = ProjectUserChanges::for_event(&user(), EventKind::Upgraded, None, first);
        assert_eq!(fresh.upgraded_at, Some(first));
        assert!(fresh.last_activity_at.is_none());

        let mut upgraded = user();
        upgraded.upgraded_at = Some(first);
        let again = ProjectUserChanges::for_event(
            &upgraded,
            EventKind::Upgraded,
            None,
            first + Duration::days(1),
        );
        assert!(again.upgraded_at.is_none());
    }

    #[test]
    fn test_activity_reference_prefers_last_activity() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut u = user();
        assert!(u.activity_reference().is_none());

        u.trial_started_at = Some(start);
        assert_eq!(u.activity_reference(), Some(start));

        u.last_activity_at = Some(start + Duration::days(2));
        assert_eq!(u.activity_reference(), Some(start + Duration::days(2)));
    }

    #[test]
    fn test_latest_event_at() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut u = user();
        assert!(u.latest_event_at().is_none());

        u.trial_started_at = Some(start);
        u.upgraded_at = Some(start + Duration::days(5));
        u.last_activity_at = Some(start + Duration::days(3));
        assert_eq!(u.latest_event_at(), Some(start + Duration::days(5)));
    }
}
