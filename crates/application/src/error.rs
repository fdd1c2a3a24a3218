//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A store or remote resource that had to hold content was absent or empty
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Stored or fetched content could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Transport failure talking to a remote collaborator
    #[error("Network error: {0}")]
    Network(String),

    /// A remote call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Local persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// A migration attempt was aborted; the user store was left untouched
    #[error("Migration failed for user {user_id}: {reason}")]
    MigrationFailed { user_id: String, reason: String },

    /// Operation invoked in a state that does not permit it
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApplicationError::Network(_) | ApplicationError::Timeout(_)
        )
    }

    /// Wrap a store failure encountered while migrating `user_id`
    pub fn migration_failed(user_id: impl ToString, reason: impl ToString) -> Self {
        Self::MigrationFailed {
            user_id: user_id.to_string(),
            reason: reason.to_string(),
        }
    }
}
