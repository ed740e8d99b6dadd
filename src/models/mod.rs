pub mod email_log;
pub mod event;
pub mod project;
pub mod project_user;
pub mod trial_settings;

// Re-export common types
pub use email_log::{EmailLog, NewEmailLog, NudgeKind, SentNudges};
pub use event::{Event, EventKind, NewEvent};
pub use project::{BillingStatus, BillingUpdate, NewProject, Project, ProjectBilling};
pub use project_user::{ProjectUser, ProjectUserChanges};
pub use trial_settings::{NewTrialSettings, NudgeThresholds, TrialSettings, TrialSettingsChanges};
