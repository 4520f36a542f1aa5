pub mod store;
pub mod storage;
pub mod payment;
pub mod push;
pub mod identity;
pub mod session;
pub mod user;

use serde::Serialize;

/// A single failed input field, reported back to API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Validation failed")]
    InvalidFields(Vec<FieldError>),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Document store error: {0}")]
    StoreError(String),
    #[error("{service}: {message}")]
    GatewayError { service: String, message: String },
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn gateway(service: &str, message: impl Into<String>) -> Self {
        CoreError::GatewayError {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::StoreError(format!("Malformed document: {}", err))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
