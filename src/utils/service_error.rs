// Service error type shared by every handler. Renders as `{ "error": ... }`.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::email::EmailError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal server error")]
    InternalError,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServiceError::EmailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            ServiceError::ValidationError(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::Unauthorized(msg)
            | ServiceError::ServiceUnavailable(msg)
            | ServiceError::ConfigurationError(msg) => msg,
            ServiceError::MethodNotAllowed => "Method not allowed".to_string(),
            // Internal details stay in the logs
            ServiceError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "Server error".to_string()
            },
            ServiceError::EmailError(msg) => {
                tracing::error!("Email error: {}", msg);
                "Server error".to_string()
            },
            ServiceError::InternalError => "Server error".to_string(),
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

// Conversion from various error types
impl From<diesel::result::Error> for ServiceError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => ServiceError::NotFound("Resource not found".to_string()),
            _ => ServiceError::DatabaseError(error.to_string()),
        }
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for ServiceError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        ServiceError::DatabaseError(format!("Connection pool error: {}", error))
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}

impl From<EmailError> for ServiceError {
    fn from(error: EmailError) -> Self {
        ServiceError::EmailError(error.to_string())
    }
}
