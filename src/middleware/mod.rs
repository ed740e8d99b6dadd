// Middleware modules for TrialRescue

pub mod api_key;
pub mod cors;
pub mod internal_auth;

pub use api_key::{extract_api_key, ProjectApiKey, API_KEY_HEADER};
pub use cors::{dashboard_cors_layer, events_cors_middleware};
pub use internal_auth::{
    check_secret_header, internal_secret_middleware, secret_matches, CRON_SECRET_HEADER,
    INTERNAL_SECRET_HEADER,
};
