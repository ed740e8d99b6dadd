// Dodo Payments webhook receiver

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    app::AppState,
    services::{verify_webhook_signature, BillingService, DodoWebhookEvent, WebhookHeaders},
    utils::{parse_json_body, service_error::ServiceError},
};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn invalid_signature() -> ServiceError {
    ServiceError::Unauthorized("Invalid signature".to_string())
}

/// Receive a payment event and activate the paying project
/// POST /api/webhooks/dodopayments
#[utoipa::path(
    post,
    path = "/api/webhooks/dodopayments",
    tag = "Webhooks",
    operation_id = "dodoPaymentsWebhook",
    params(
        ("webhook-id" = String, Header, description = "Delivery id"),
        ("webhook-timestamp" = String, Header, description = "Delivery timestamp"),
        ("webhook-signature" = String, Header, description = "Space separated v1,<base64> signatures")
    ),
    responses(
        (status = 200, description = "Event received"),
        (status = 400, description = "Body is not JSON"),
        (status = 401, description = "Signature missing or invalid")
    )
)]
pub async fn dodo_payments_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ServiceError> {
    let Some(secret) = state.config.billing.webhook_secret.as_deref() else {
        warn!("DODO_PAYMENTS_WEBHOOK_SECRET is not set; rejecting webhook");
        return Err(invalid_signature());
    };

    let (Some(id), Some(timestamp), Some(signature)) = (
        header(&headers, "webhook-id"),
        header(&headers, "webhook-timestamp"),
        header(&headers, "webhook-signature"),
    ) else {
        warn!("Webhook missing required headers");
        return Err(invalid_signature());
    };

    let webhook_headers = WebhookHeaders {
        id,
        timestamp,
        signature,
    };
    if !verify_webhook_signature(secret, &webhook_headers, &body) {
        warn!(webhook_id = %id, "Invalid webhook signature");
        return Err(invalid_signature());
    }

    let event: DodoWebhookEvent = parse_json_body(&body)?;
    info!(webhook_id = %id, event_type = %event.event_type, "Dodo webhook received");

    BillingService::new(&state).handle_event(&event).await?;

    Ok(Json(json!({ "received": true })))
}
