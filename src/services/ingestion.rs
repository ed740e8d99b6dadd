// Event ingestion: authenticate by project API key, update the trial user,
// then record the raw event on a best-effort basis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{Event, EventKind, NewEvent, Project, ProjectUser},
    utils::{service_error::ServiceError, validation::trim_optional_field},
};

/// Column width of `project_users.external_user_id`
pub const MAX_EXTERNAL_ID_LEN: usize = 255;

/// Body accepted by `POST /api/events`. Fields are loose here and checked in
/// [`IngestEventRequest::validate_event`] so each problem gets its own message.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct IngestEventRequest {
    /// `user_signed_up`, `user_activity` or `user_upgraded`
    pub event_type: Option<String>,
    #[schema(value_type = Option<String>)]
    pub external_user_id: Option<JsonValue>,
    pub email: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub data: Option<JsonValue>,
    /// RFC 3339 timestamp; defaults to the time of receipt
    pub occurred_at: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    pub kind: EventKind,
    pub external_user_id: String,
    pub email: Option<String>,
    pub data: Option<JsonValue>,
    pub occurred_at: DateTime<Utc>,
}

/// Numeric ids are accepted and stored as their decimal form
fn external_id_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

impl IngestEventRequest {
    pub fn validate_event(self, now: DateTime<Utc>) -> Result<ValidatedEvent, ServiceError> {
        let event_type = trim_optional_field(self.event_type.as_ref())
            .ok_or_else(|| ServiceError::ValidationError("Missing event_type".to_string()))?;

        let kind = event_type
            .parse::<EventKind>()
            .map_err(ServiceError::ValidationError)?;

        let external_user_id = self
            .external_user_id
            .as_ref()
            .and_then(external_id_string)
            .ok_or_else(|| ServiceError::ValidationError("Missing external_user_id".to_string()))?;
        if external_user_id.chars().count() > MAX_EXTERNAL_ID_LEN {
            return Err(ServiceError::ValidationError(
                "Invalid external_user_id".to_string(),
            ));
        }

        let email = trim_optional_field(self.email.as_ref());
        if let Some(email) = &email {
            if !validator::validate_email(email.as_str()) {
                return Err(ServiceError::ValidationError("Invalid email".to_string()));
            }
        }
        if kind == EventKind::SignedUp && email.is_none() {
            return Err(ServiceError::ValidationError(
                "Missing email for user_signed_up".to_string(),
            ));
        }

        // Clamped to the time of receipt; a future timestamp would mute nudges
        let occurred_at = match trim_optional_field(self.occurred_at.as_ref()) {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc).min(now))
                .map_err(|_| ServiceError::ValidationError("Invalid occurred_at".to_string()))?,
            None => now,
        };

        Ok(ValidatedEvent {
            kind,
            external_user_id,
            email,
            data: self.data.filter(|d| !d.is_null()),
            occurred_at,
        })
    }
}

pub struct IngestionService {
    diesel_pool: DieselPool,
}

impl IngestionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    /// Resolve the project owning an API key
    #[instrument(skip(self, api_key))]
    pub async fn authenticate(&self, api_key: &str) -> Result<Project, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        Project::find_by_api_key(&mut conn, api_key)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid API key".to_string()))
    }

    /// Apply the event to the user row, then append it to the audit log.
    /// Only the user update can fail the request.
    #[instrument(skip(self, event), fields(kind = %event.kind.as_str()))]
    pub async fn ingest(
        &self,
        project_id: Uuid,
        event: ValidatedEvent,
    ) -> Result<ProjectUser, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        let user = ProjectUser::apply_event(
            &mut conn,
            project_id,
            &event.external_user_id,
            event.kind,
            event.email.as_deref(),
            event.occurred_at,
        )
        .await
        .map_err(|e| {
            error!("Error upserting project user: {}", e);
            ServiceError::from(e)
        })?;

        let audit = NewEvent {
            id: Uuid::new_v4(),
            project_id,
            user_id: Some(user.id),
            external_user_id: event.external_user_id,
            event_type: event.kind.as_str().to_string(),
            data: event.data,
            created_at: event.occurred_at,
        };

        if let Err(e) = Event::insert(&mut conn, &audit).await {
            error!(user_id = %user.id, "Error inserting event: {}", e);
        } else {
            info!(user_id = %user.id, "Event recorded");
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap()
    }

    fn request(value: JsonValue) -> IngestEventRequest {
        serde_json::from_value(value).unwrap()
    }

    fn error_message(result: Result<ValidatedEvent, ServiceError>) -> String {
        match result {
            Err(ServiceError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_signup() {
        let event = request(json!({
            "event_type": "user_signed_up",
            "external_user_id": "u_42",
            "email": "user@example.com",
            "data": { "plan": "pro" }
        }))
        .validate_event(now())
        .unwrap();

        assert_eq!(event.kind, EventKind::SignedUp);
        assert_eq!(event.external_user_id, "u_42");
        assert_eq!(event.email.as_deref(), Some("user@example.com"));
        assert_eq!(event.occurred_at, now());
        assert_eq!(event.data, Some(json!({ "plan": "pro" })));
    }

    #[test]
    fn test_numeric_external_id() {
        let event = request(json!({ "event_type": "user_activity", "external_user_id": 1234 }))
            .validate_event(now())
            .unwrap();
        assert_eq!(event.external_user_id, "1234");
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            error_message(request(json!({})).validate_event(now())),
            "Missing event_type"
        );
        assert_eq!(
            error_message(request(json!({ "event_type": "user_activity" })).validate_event(now())),
            "Missing external_user_id"
        );
        assert_eq!(
            error_message(
                request(json!({ "event_type": "user_activity", "external_user_id": "  " }))
                    .validate_event(now())
            ),
            "Missing external_user_id"
        );
    }

    #[test]
    fn test_unknown_event_type() {
        assert_eq!(
            error_message(
                request(json!({ "event_type": "user_deleted", "external_user_id": "u" }))
                    .validate_event(now())
            ),
            "Unknown event_type: user_deleted"
        );
    }

    #[test]
    fn test_signup_requires_valid_email() {
        assert_eq!(
            error_message(
                request(json!({ "event_type": "user_signed_up", "external_user_id": "u" }))
                    .validate_event(now())
            ),
            "Missing email for user_signed_up"
        );
        assert_eq!(
            error_message(
                request(json!({
                    "event_type": "user_activity",
                    "external_user_id": "u",
                    "email": "not-an-email"
                }))
                .validate_event(now())
            ),
            "Invalid email"
        );
    }

    #[test]
    fn test_occurred_at() {
        let event = request(json!({
            "event_type": "user_upgraded",
            "external_user_id": "u",
            "occurred_at": "2025-04-30T10:00:00+02:00"
        }))
        .validate_event(now())
        .unwrap();
        assert_eq!(
            event.occurred_at,
            Utc.with_ymd_and_hms(2025, 4, 30, 8, 0, 0).unwrap()
        );

        assert_eq!(
            error_message(
                request(json!({
                    "event_type": "user_upgraded",
                    "external_user_id": "u",
                    "occurred_at": "yesterday"
                }))
                .validate_event(now())
            ),
            "Invalid occurred_at"
        );
    }

    #[test]
    fn test_future_occurred_at_is_clamped() {
        let event = request(json!({
            "event_type": "user_activity",
            "external_user_id": "u",
            "occurred_at": "2030-01-01T00:00:00Z"
        }))
        .validate_event(now())
        .unwrap();
        assert_eq!(event.occurred_at, now());
    }

    #[test]
    fn test_external_id_length_limit() {
        let at_limit = "a".repeat(MAX_EXTERNAL_ID_LEN);
        let event = request(json!({ "event_type": "user_activity", "external_user_id": at_limit }))
            .validate_event(now())
            .unwrap();
        assert_eq!(event.external_user_id.len(), MAX_EXTERNAL_ID_LEN);

        assert_eq!(
            error_message(
                request(json!({
                    "event_type": "user_activity",
                    "external_user_id": "a".repeat(MAX_EXTERNAL_ID_LEN + 1)
                }))
                .validate_event(now())
            ),
            "Invalid external_user_id"
        );
    }
}
