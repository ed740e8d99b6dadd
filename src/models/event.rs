// Raw event audit log

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::events;

/// Lifecycle event kinds accepted by the ingestion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EventKind {
    #[serde(rename = "user_signed_up")]
    SignedUp,
    #[serde(rename = "user_activity")]
    Activity,
    #[serde(rename = "user_upgraded")]
    Upgraded,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SignedUp => "user_signed_up",
            EventKind::Activity => "user_activity",
            EventKind::Upgraded => "user_upgraded",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_signed_up" => Ok(EventKind::SignedUp),
            "user_activity" => Ok(EventKind::Activity),
            "user_upgraded" => Ok(EventKind::Upgraded),
            other => Err(format!("Unknown event_type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Event {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Option<Uuid>,
    pub external_user_id: String,
    pub event_type: String,
    pub data: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Option<Uuid>,
    pub external_user_id: String,
    pub event_type: String,
    pub data: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub async fn insert(
        conn: &mut AsyncPgConnection,
        new_event: &NewEvent,
    ) -> Result<(), diesel::result::Error> {
        diesel::insert_into(events::table)
            .values(new_event)
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!("user_signed_up".parse::<EventKind>(), Ok(EventKind::SignedUp));
        assert_eq!("user_activity".parse::<EventKind>(), Ok(EventKind::Activity));
        assert_eq!("user_upgraded".parse::<EventKind>(), Ok(EventKind::Upgraded));
        assert!("signed_up".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_event_kind_serde_names() {
        let json = serde_json::to_string(&EventKind::SignedUp).unwrap();
        assert_eq!(json, "\"user_signed_up\"");
    }
}
