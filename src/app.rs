// Application state shared across handlers
use std::sync::Arc;

use crate::{app_config::AppConfig, db::DieselPool, services::EmailService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub email_service: Arc<EmailService>,
    pub max_connections: u32,
}
