// Email Sender - delivery of built messages to the email provider

use super::types::{EmailError, EmailMessage, ResendEmailPayload, ResendEmailResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Anything that can deliver an email and report the provider message id
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<Option<String>, EmailError>;
}

/// Sender for the Resend HTTP API
#[derive(Clone)]
pub struct EmailSender {
    client: Arc<Client>,
    api_key: String,
    api_url: String,
}

impl EmailSender {
    /// Create a new email sender for Resend API
    pub fn new_resend(api_key: String, api_url: String) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| EmailError::ConfigError(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            api_key,
            api_url,
        })
    }
}

#[async_trait]
impl Mailer for EmailSender {
    /// Send an email message. No retry: a failed nudge is picked up by the next sweep.
    #[instrument(skip(self, message), fields(to = ?message.to, subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> Result<Option<String>, EmailError> {
        let payload: ResendEmailPayload = message.into();

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => {
                // A body we cannot parse still means the provider accepted the email
                let message_id = res
                    .json::<ResendEmailResponse>()
                    .await
                    .ok()
                    .and_then(|r| r.id);
                info!(message_id = ?message_id, "Email sent successfully");
                Ok(message_id)
            },
            Ok(res) => {
                let status = res.status();
                let error_text = res
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                error!(
                    "Failed to send email. Status: {}, Error: {}",
                    status, error_text
                );

                if status.as_u16() == 429 {
                    Err(EmailError::RateLimitExceeded)
                } else if status.is_server_error() {
                    Err(EmailError::ServiceUnavailable)
                } else {
                    Err(EmailError::SendError(format!(
                        "Email send failed with status {}: {}",
                        status, error_text
                    )))
                }
            },
            Err(e) => {
                error!("Network error while sending email: {:?}", e);
                Err(EmailError::SendError(format!("Network error: {}", e)))
            },
        }
    }
}
