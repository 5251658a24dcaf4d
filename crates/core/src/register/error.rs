//! Register error types.
//!
//! Every variant carries a message naming the rule that was violated, so
//! callers can surface it verbatim.

use cuadra_shared::AppError;
use cuadra_shared::types::{LedgerEntryId, RegisterSessionId};
use thiserror::Error;

/// Errors that can occur during register operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// Input rejected before any store access.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another open session already exists for the register.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation not allowed in the session's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Session or entry does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Error description.
        message: String,
        /// Whether the caller may retry the operation as-is.
        retryable: bool,
    },
}

impl RegisterError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not found error for a session.
    #[must_use]
    pub fn session_not_found(id: RegisterSessionId) -> Self {
        Self::NotFound(format!("register session {id} does not exist"))
    }

    /// Creates a not found error for a ledger entry.
    #[must_use]
    pub fn entry_not_found(id: LedgerEntryId) -> Self {
        Self::NotFound(format!("ledger entry {id} does not exist"))
    }

    /// Creates the error returned when a closed session is mutated.
    #[must_use]
    pub fn session_closed(id: RegisterSessionId) -> Self {
        Self::InvalidState(format!("register session {id} is already closed"))
    }

    /// Creates the error returned when an open session is reviewed.
    #[must_use]
    pub fn session_not_closed(id: RegisterSessionId) -> Self {
        Self::InvalidState(format!(
            "register session {id} is still open and cannot be reviewed"
        ))
    }

    /// Creates the error returned when a session's review is already decided.
    pub fn already_reviewed(id: RegisterSessionId, status: impl std::fmt::Display) -> Self {
        Self::InvalidState(format!("register session {id} was already {status}"))
    }

    /// Creates the error returned when a register already has an open session.
    pub fn register_busy(register_id: impl std::fmt::Display) -> Self {
        Self::Conflict(format!("register {register_id} already has an open session"))
    }

    /// Creates a non-retryable storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a retryable storage error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            retryable: true,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage {
                retryable: true,
                ..
            }
        )
    }
}

impl From<RegisterError> for AppError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Validation(msg) => Self::Validation(msg),
            RegisterError::Conflict(msg) => Self::Conflict(msg),
            RegisterError::InvalidState(msg) => Self::InvalidState(msg),
            RegisterError::NotFound(msg) => Self::NotFound(msg),
            RegisterError::Storage {
                message,
                retryable: true,
            } => Self::Unavailable(message),
            RegisterError::Storage { message, .. } => Self::Database(message),
        }
    }
}
