//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed user input (empty title, unparseable start time, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored record or collection could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// User identifier is empty or cannot be used as a store key
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
}

impl DomainError {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
