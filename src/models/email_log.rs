// Append-only record of nudge emails sent. A row for (user, kind) suppresses that kind.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::email_logs;

/// Nudge tiers, in increasing urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NudgeKind {
    Nudge1,
    Nudge2,
    Nudge3,
}

impl NudgeKind {
    /// Most urgent first; the sweep picks the first eligible kind in this order
    pub const BY_URGENCY: [NudgeKind; 3] = [NudgeKind::Nudge3, NudgeKind::Nudge2, NudgeKind::Nudge1];

    pub fn as_str(&self) -> &'static str {
        match self {
            NudgeKind::Nudge1 => "nudge1",
            NudgeKind::Nudge2 => "nudge2",
            NudgeKind::Nudge3 => "nudge3",
        }
    }
}

impl std::fmt::Display for NudgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NudgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nudge1" => Ok(NudgeKind::Nudge1),
            "nudge2" => Ok(NudgeKind::Nudge2),
            "nudge3" => Ok(NudgeKind::Nudge3),
            other => Err(format!("Unknown nudge kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = email_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmailLog {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub email_type: String,
    pub provider_message_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = email_logs)]
pub struct NewEmailLog {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub email_type: String,
    pub provider_message_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl NewEmailLog {
    pub fn new(
        project_id: Uuid,
        user_id: Uuid,
        kind: NudgeKind,
        provider_message_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            email_type: kind.as_str().to_string(),
            provider_message_id,
            sent_at: Utc::now(),
        }
    }
}

/// Nudge kinds already sent, per project user
pub type SentNudges = HashMap<Uuid, HashSet<NudgeKind>>;

impl EmailLog {
    pub async fn insert(
        conn: &mut AsyncPgConnection,
        log: &NewEmailLog,
    ) -> Result<(), diesel::result::Error> {
        diesel::insert_into(email_logs::table)
            .values(log)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn logs_for_project(
        conn: &mut AsyncPgConnection,
        project: Uuid,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        use crate::schema::email_logs::dsl;

        dsl::email_logs
            .filter(dsl::project_id.eq(project))
            .select(EmailLog::as_select())
            .load(conn)
            .await
    }

    pub async fn sent_kinds_for_project(
        conn: &mut AsyncPgConnection,
        project: Uuid,
    ) -> Result<SentNudges, diesel::result::Error> {
        use crate::schema::email_logs::dsl;

        let rows: Vec<(Uuid, String)> = dsl::email_logs
            .filter(dsl::project_id.eq(project))
            .select((dsl::user_id, dsl::email_type))
            .load(conn)
            .await?;

        Ok(group_sent_kinds(rows))
    }
}

/// Unknown email types are ignored
pub fn group_sent_kinds(rows: impl IntoIterator<Item = (Uuid, String)>) -> SentNudges {
    let mut sent = SentNudges::new();
    for (user_id, email_type) in rows {
        if let Ok(kind) = email_type.parse::<NudgeKind>() {
            sent.entry(user_id).or_default().insert(kind);
        }
    }
    sent
}
