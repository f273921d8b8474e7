//! Session error types

use thiserror::Error;

use crate::constructor::ConstructorError;
use crate::ledger::LedgerError;
use crate::recovery::ReintroductionError;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while driving an elicitation session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The ledger rejected an update
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The constructor failed outside a reintroduction
    #[error("constructor failed: {0}")]
    Constructor(#[from] ConstructorError),

    /// Reintroducing consistency failed
    #[error(transparent)]
    Reintroduction(#[from] ReintroductionError),
}

impl SessionError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SessionError::Config(message.into())
    }

    /// Returns the string error code
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Config(_) => "PREFLEDGER_CONFIG_ERROR",
            SessionError::Ledger(e) => e.code(),
            SessionError::Constructor(e) => e.code(),
            SessionError::Reintroduction(e) => e.code(),
        }
    }

    /// True if the error signals a broken constructor contract
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Reintroduction(e) if e.is_fatal())
    }
}
