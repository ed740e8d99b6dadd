// Utility modules for TrialRescue

pub mod service_error;
pub mod validation;

pub use service_error::ServiceError;
pub use validation::{parse_json_body, resolve_project_id, trim_optional_field, ProjectQuery};
