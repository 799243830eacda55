//! Domain error taxonomy
//!
//! Operator-facing messages are carried in English and Indonesian.

use thiserror::Error;

/// Errors raised by the purchase order rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Caller input violates a precondition
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_id: String,
    },

    /// A referenced order, line or item does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Mutation attempted on a terminal line or order
    #[error("Invalid state: {0}")]
    State(String),
}

impl DomainError {
    pub fn validation(field: &str, message: &str, message_id: &str) -> Self {
        DomainError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_id: message_id.to_string(),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
