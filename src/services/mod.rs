// Services module for TrialRescue
// Business logic layer for the application

pub mod billing;
pub mod email;
pub mod ingestion;
pub mod project;
pub mod sweep;

// Re-export commonly used services
pub use billing::{verify_webhook_signature, BillingService, DodoWebhookEvent, WebhookHeaders};
pub use email::{EmailError, EmailService, Mailer};
pub use ingestion::{IngestEventRequest, IngestionService, ValidatedEvent};
pub use project::{DashboardSummary, ProjectHandle, ProjectService};
pub use sweep::{ProjectSweepReport, SweepReport, SweepService, SweepSkipReason};
