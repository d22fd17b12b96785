//! Application-level error types.
//!
//! Degradations inside a turn (partial analysis, an exhausted provider
//! chain) are not errors: the orchestrator absorbs them and still produces a
//! response. Errors here are the cases where a turn genuinely cannot
//! proceed.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, DomainError, ValidationError};
use crate::ports::RepositoryError;

/// Errors surfaced to callers of the conversation service.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Input failed validation before any work happened.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced conversation does not exist.
    #[error("conversation {0} not found")]
    NotFound(ConversationId),

    /// A domain rule rejected the operation (terminal conversation, illegal
    /// transition, context depth, duplicate open conversation).
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Persistence failed mid-turn; the conversation was rolled back and the
    /// caller may retry.
    #[error("storage error: {0}")]
    Storage(String),

    /// Rule or application configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<RepositoryError> for ProcessError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConversationNotFound(id) => ProcessError::NotFound(id),
            RepositoryError::Storage(message) => ProcessError::Storage(message),
        }
    }
}

impl ProcessError {
    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_not_found_maps_to_not_found() {
        let id = ConversationId::new();
        let err: ProcessError = RepositoryError::ConversationNotFound(id).into();
        assert!(matches!(err, ProcessError::NotFound(found) if found == id));
    }

    #[test]
    fn only_storage_errors_are_retryable() {
        assert!(ProcessError::Storage("io".into()).is_retryable());
        assert!(!ProcessError::NotFound(ConversationId::new()).is_retryable());
    }
}
