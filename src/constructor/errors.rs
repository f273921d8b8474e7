//! Constructor error types

use thiserror::Error;

use super::contract::ConstructorOperation;

/// Result type for constructor operations
pub type ConstructorResult<T> = Result<T, ConstructorError>;

/// Errors a model constructor may report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructorError {
    /// Model construction failed
    #[error("model construction failed: {0}")]
    BuildFailed(String),

    /// An incremental notification could not be applied
    #[error("notification rejected: {0}")]
    NotificationRejected(String),

    /// The model cache could not be cleared
    #[error("cache invalidation failed: {0}")]
    ClearFailed(String),

    /// Deliberate failure injected by a test double
    #[error("injected fault on {operation} call {call}")]
    Injected {
        operation: ConstructorOperation,
        call: usize,
    },
}

impl ConstructorError {
    /// Returns the string error code
    pub fn code(&self) -> &'static str {
        match self {
            ConstructorError::BuildFailed(_) => "PREFLEDGER_CONSTRUCTOR_BUILD_FAILED",
            ConstructorError::NotificationRejected(_) => "PREFLEDGER_CONSTRUCTOR_NOTIFY_REJECTED",
            ConstructorError::ClearFailed(_) => "PREFLEDGER_CONSTRUCTOR_CLEAR_FAILED",
            ConstructorError::Injected { .. } => "PREFLEDGER_CONSTRUCTOR_INJECTED_FAULT",
        }
    }
}
