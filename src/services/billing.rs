// Billing: Dodo Payments webhook verification and project activation

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{error, info, instrument, warn};

use crate::{
    app::AppState,
    db::DieselPool,
    models::{BillingStatus, BillingUpdate, Project, ProjectBilling},
    services::project::UpdateBillingRequest,
    utils::service_error::ServiceError,
};

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";

/// Event types that mean the customer has paid
pub const ACTIVATING_EVENT_TYPES: [&str; 5] = [
    "payment.completed",
    "payment.succeeded",
    "subscription.created",
    "subscription.active",
    "subscription.renewed",
];

/// Standard-webhooks headers sent with every delivery
#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct DodoWebhookEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<JsonValue>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, JsonValue>,
}

/// Signing key bytes: `whsec_` is stripped and the remainder base64-decoded.
/// A secret that is not valid base64 is used as raw bytes.
fn signing_key(secret: &str) -> Vec<u8> {
    let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    BASE64
        .decode(encoded)
        .unwrap_or_else(|_| encoded.as_bytes().to_vec())
}

/// Verify any `v1,<base64>` candidate in the signature header against
/// HMAC-SHA256 over `"{id}.{timestamp}.{body}"`
pub fn verify_webhook_signature(secret: &str, headers: &WebhookHeaders<'_>, body: &[u8]) -> bool {
    let key = signing_key(secret);
    let mut mac = match HmacSha256::new_from_slice(&key) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(headers.id.as_bytes());
    mac.update(b".");
    mac.update(headers.timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    headers
        .signature
        .split_whitespace()
        .filter_map(|candidate| candidate.split_once(','))
        .filter(|(version, _)| *version == "v1")
        .filter_map(|(_, sig)| BASE64.decode(sig).ok())
        .any(|received| {
            received.len() == expected.len() && bool::from(received.ct_eq(expected.as_slice()))
        })
}

pub fn is_activating_event(event_type: &str) -> bool {
    ACTIVATING_EVENT_TYPES.contains(&event_type)
}

/// Customer email from the payload, trying the known locations in order
pub fn extract_customer_email(payload: &JsonValue) -> Option<String> {
    const PATHS: [&str; 4] = [
        "/customer/email",
        "/data/customer/email",
        "/billing/email",
        "/email",
    ];

    PATHS
        .iter()
        .filter_map(|path| payload.pointer(path))
        .filter_map(JsonValue::as_str)
        .map(str::trim)
        .find(|email| !email.is_empty())
        .map(str::to_string)
}

impl DodoWebhookEvent {
    /// `data` when present, otherwise the event object itself
    pub fn payload(&self) -> JsonValue {
        match &self.data {
            Some(data) if !data.is_null() => data.clone(),
            _ => JsonValue::Object(self.rest.clone()),
        }
    }
}

pub struct BillingService {
    diesel_pool: DieselPool,
    activation_plan: String,
}

impl BillingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            activation_plan: state.config.billing.activation_plan.clone(),
        }
    }

    /// Apply a verified webhook event. Lookup misses are logged, never surfaced.
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn handle_event(&self, event: &DodoWebhookEvent) -> Result<(), ServiceError> {
        if !is_activating_event(&event.event_type) {
            info!("Ignoring webhook event type {}", event.event_type);
            return Ok(());
        }

        let Some(email) = extract_customer_email(&event.payload()) else {
            warn!("No customer email found in webhook payload");
            return Ok(());
        };

        let mut conn = self.diesel_pool.get().await?;

        let project = match Project::find_latest_by_owner_email(&mut conn, &email).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                warn!("No project found for billing email {}", email);
                return Ok(());
            },
            Err(e) => {
                error!("Error looking up project by billing email: {}", e);
                return Ok(());
            },
        };

        let update = BillingUpdate {
            billing_status: Some(BillingStatus::Active.as_str().to_string()),
            billing_plan: Some(self.activation_plan.clone()),
            billing_updated_at: Utc::now(),
        };

        match Project::update_billing(&mut conn, project.id, &update).await {
            Ok(_) => info!(
                project_id = %project.id,
                "Activated billing for {} via webhook", email
            ),
            Err(e) => error!(project_id = %project.id, "Error updating billing status: {}", e),
        }

        Ok(())
    }

    /// Manual billing override from the dashboard
    #[instrument(skip(self, request))]
    pub async fn override_billing(
        &self,
        project_id: uuid::Uuid,
        request: &UpdateBillingRequest,
    ) -> Result<ProjectBilling, ServiceError> {
        let changes = request.validate_override()?;

        let mut conn = self.diesel_pool.get().await?;

        let update = BillingUpdate {
            billing_status: changes.billing_status.map(|s| s.as_str().to_string()),
            billing_plan: changes.billing_plan,
            billing_updated_at: Utc::now(),
        };

        Project::update_billing(&mut conn, project_id, &update)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Project not found".to_string()))
    }

    pub async fn billing(&self, project_id: uuid::Uuid) -> Result<ProjectBilling, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        Project::billing(&mut conn, project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Project not found".to_string()))
    }
}
