// Email Service Module
// Main orchestration module that coordinates builders and sender

pub mod builders;
pub mod sender;
pub mod types;

use self::types::EmailBuilder;
use crate::app_config::EmailConfig;
use crate::models::NudgeKind;
use builders::NudgeEmailBuilder;
use handlebars::Handlebars;
use std::sync::Arc;
use tracing::{info, instrument};

/// Email service for sending nudge emails
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<Arc<dyn Mailer>>,
    config: EmailConfig,
    templates: Arc<Handlebars<'static>>,
}

impl EmailService {
    /// Create a new email service instance. Without a Resend key the service
    /// exists but reports itself unconfigured.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mailer: Option<Arc<dyn Mailer>> = match config.resend_api_key.as_deref() {
            Some(key) if config.is_configured() => Some(Arc::new(EmailSender::new_resend(
                key.to_string(),
                config.resend_api_url.clone(),
            )?)),
            _ => None,
        };

        Self::build(config, mailer)
    }

    /// Service backed by a caller-supplied mailer
    pub fn with_mailer(config: EmailConfig, mailer: Arc<dyn Mailer>) -> Result<Self, EmailError> {
        Self::build(config, Some(mailer))
    }

    fn build(config: EmailConfig, mailer: Option<Arc<dyn Mailer>>) -> Result<Self, EmailError> {
        let mut templates = Handlebars::new();
        Self::register_templates(&mut templates)?;

        Ok(Self {
            mailer,
            config,
            templates: Arc::new(templates),
        })
    }

    /// Register all email templates
    fn register_templates(templates: &mut Handlebars) -> Result<(), EmailError> {
        let nudge_template = include_str!("../../../templates/email/nudge.html");
        templates
            .register_template_string("nudge", nudge_template)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_some()
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Fill unset project settings with the configured fallbacks
    pub fn branding(
        &self,
        product_name: Option<&str>,
        support_email: Option<&str>,
        app_url: Option<&str>,
    ) -> NudgeBranding {
        let pick = |value: Option<&str>, default: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        NudgeBranding {
            product_name: pick(product_name, &self.config.default_product_name),
            support_email: pick(support_email, &self.config.default_support_email),
            app_url: pick(app_url, &self.config.default_app_url),
        }
    }

    /// Send one nudge and return the provider message id, if any
    #[instrument(skip(self, branding), fields(product = %branding.product_name))]
    pub async fn send_nudge(
        &self,
        to_email: &str,
        kind: NudgeKind,
        branding: &NudgeBranding,
    ) -> Result<Option<String>, EmailError> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| EmailError::ConfigError("Resend not configured".to_string()))?;

        info!("Sending {} to {}", kind, to_email);

        let message = NudgeEmailBuilder::new(
            to_email,
            kind,
            branding,
            &self.config.from_email,
            &self.templates,
        )
        .build()?;

        mailer.send(message).await
    }
}

// Re-export commonly used types for convenience
pub use sender::{EmailSender, Mailer};
pub use types::{EmailError, EmailMessage, NudgeBranding};
