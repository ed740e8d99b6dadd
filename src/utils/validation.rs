// Validation utilities for request fields

use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

use super::service_error::ServiceError;

/// `?projectId=` on dashboard requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectQuery {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
}

/// Trim an optional string field
///
/// # Returns
/// * `None` - If the field is None or empty after trimming
/// * `Some(String)` - The trimmed string if not empty
pub fn trim_optional_field(field: Option<&String>) -> Option<String> {
    field.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Resolve the project a dashboard request targets: explicit id, else the configured default
pub fn resolve_project_id(
    raw: Option<&String>,
    default: Option<Uuid>,
) -> Result<Uuid, ServiceError> {
    match trim_optional_field(raw) {
        Some(value) => Uuid::parse_str(&value)
            .map_err(|_| ServiceError::ValidationError("Invalid projectId".to_string())),
        None => default.ok_or_else(|| ServiceError::ValidationError("Missing projectId".to_string())),
    }
}

/// Parse a JSON request body, reporting failures in the common error shape
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected JSON body: {}", e);
        ServiceError::ValidationError("Invalid JSON body".to_string())
    })
}
