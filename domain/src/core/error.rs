//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0} tool call(s) still awaiting results")]
    PendingToolResults(usize),

    #[error("Tool result references unknown call id '{0}'")]
    UnknownCallId(String),

    #[error("Duplicate tool call id '{0}'")]
    DuplicateCallId(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
