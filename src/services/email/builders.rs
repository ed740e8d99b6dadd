// Email Builders - construct the nudge emails sent by the sweep

use super::types::{EmailBuilder, EmailError, EmailMessage, NudgeBranding, NudgeEmailData};
use crate::models::NudgeKind;
use handlebars::{html_escape, Handlebars};
use tracing::instrument;

/// Used whenever a project has not set a product name
pub const FALLBACK_PRODUCT_NAME: &str = "your product";

fn display_name(product_name: &str) -> &str {
    let trimmed = product_name.trim();
    if trimmed.is_empty() {
        FALLBACK_PRODUCT_NAME
    } else {
        trimmed
    }
}

pub fn nudge_subject(kind: NudgeKind, product_name: &str) -> String {
    let name = display_name(product_name);
    match kind {
        NudgeKind::Nudge1 => format!("Still on your {} trial?", name),
        NudgeKind::Nudge2 => format!("Your {} trial is idling", name),
        NudgeKind::Nudge3 => format!("Before your {} trial fully goes cold…", name),
    }
}

/// Opening line; the product name is emphasised in the HTML variant
fn nudge_intro(kind: NudgeKind, name: &str, html: bool) -> String {
    let emphasised = if html {
        format!("<strong>{}</strong>", html_escape(name))
    } else {
        name.to_string()
    };

    match kind {
        NudgeKind::Nudge1 => format!(
            "You started a trial with {}, but you haven’t really used it yet.",
            emphasised
        ),
        NudgeKind::Nudge2 => format!(
            "Your {} trial is sitting there without much action.",
            emphasised
        ),
        NudgeKind::Nudge3 => format!(
            "Your trial with {} is about to fade out completely.",
            emphasised
        ),
    }
}

pub fn nudge_text(kind: NudgeKind, product_name: &str, app_url: &str) -> String {
    let name = display_name(product_name);
    format!(
        "Don’t let your {name} trial go cold.\n\n\
        {intro}\n\n\
        Most trials quietly die because people get busy, not because the product is bad.\n\
        Take 5 minutes to jump back in, run one meaningful action, and see if {name} is worth keeping.\n\n\
        Open my trial: {app_url}\n\n\
        This reminder was sent automatically on behalf of {name} because you started a trial and haven’t been active recently.\n",
        name = name,
        intro = nudge_intro(kind, name, false),
        app_url = app_url,
    )
}

/// Builder for the three inactivity nudges
pub struct NudgeEmailBuilder<'a> {
    to_email: &'a str,
    kind: NudgeKind,
    branding: &'a NudgeBranding,
    from_email: &'a str,
    templates: &'a Handlebars<'a>,
}

impl<'a> NudgeEmailBuilder<'a> {
    pub fn new(
        to_email: &'a str,
        kind: NudgeKind,
        branding: &'a NudgeBranding,
        from_email: &'a str,
        templates: &'a Handlebars<'a>,
    ) -> Self {
        Self {
            to_email,
            kind,
            branding,
            from_email,
            templates,
        }
    }
}

impl<'a> EmailBuilder for NudgeEmailBuilder<'a> {
    #[instrument(skip(self), fields(kind = %self.kind))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let name = display_name(&self.branding.product_name);

        let data = NudgeEmailData {
            product_name: name.to_string(),
            intro_html: nudge_intro(self.kind, name, true),
            app_url: self.branding.app_url.clone(),
        };

        let html = self
            .templates
            .render("nudge", &data)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        // The display name is the tenant's product, the mailbox is ours
        Ok(EmailMessage::new(
            format!("{} <{}>", name, self.from_email),
            vec![self.to_email.to_string()],
            nudge_subject(self.kind, name),
            html,
        )
        .with_text(nudge_text(self.kind, name, &self.branding.app_url))
        .with_reply_to(self.branding.support_email.clone()))
    }
}
