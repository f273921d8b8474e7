//! Reintroduction error types
//!
//! Error codes:
//! - PREFLEDGER_PRECONDITION_VIOLATION (ERROR)
//! - PREFLEDGER_CONSTRUCTOR_FAILURE (ERROR)
//! - PREFLEDGER_CONTRACT_VIOLATION (FATAL)
//!
//! No error is handled inside the handler; every error aborts the call and no
//! partial report is returned.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::constructor::{ConstructorError, ConstructorOperation};
use crate::ledger::RecordId;
use crate::observability::Severity;

/// Handler phase in which a constructor call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Oldest-first removal until consistent
    Shrink,
    /// Newest-discarded-first re-admission
    Recover,
}

impl Phase {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Shrink => "shrink",
            Phase::Recover => "recover",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by an inconsistency handler
#[derive(Debug, Error)]
pub enum ReintroductionError {
    /// Invalid input or lifecycle misuse, detected before any constructor call
    #[error("precondition violated: {reason}")]
    PreconditionViolation { reason: String },

    /// A constructor call failed during the shrink/recover loop
    #[error(
        "constructor {operation} failed in {phase} phase at attempt {attempt}{}: {source}",
        record_suffix(.record)
    )]
    ConstructorFailure {
        phase: Phase,
        attempt: u32,
        operation: ConstructorOperation,
        record: Option<RecordId>,
        #[source]
        source: ConstructorError,
    },

    /// Shrinking reached the empty sequence and it was still inconsistent
    #[error(
        "constructor reported the empty sequence inconsistent after {attempts} attempts \
         ({removed} statements removed)"
    )]
    ContractViolation { attempts: u32, removed: usize },
}

fn record_suffix(record: &Option<RecordId>) -> String {
    match record {
        Some(id) => format!(" on record {}", id),
        None => String::new(),
    }
}

impl ReintroductionError {
    pub(crate) fn precondition(reason: impl Into<String>) -> Self {
        ReintroductionError::PreconditionViolation {
            reason: reason.into(),
        }
    }

    /// Returns the string error code
    pub fn code(&self) -> &'static str {
        match self {
            ReintroductionError::PreconditionViolation { .. } => {
                "PREFLEDGER_PRECONDITION_VIOLATION"
            }
            ReintroductionError::ConstructorFailure { .. } => "PREFLEDGER_CONSTRUCTOR_FAILURE",
            ReintroductionError::ContractViolation { .. } => "PREFLEDGER_CONTRACT_VIOLATION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ReintroductionError::ContractViolation { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// True if the error signals a broken constructor contract
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for reintroduction operations
pub type ReintroductionResult<T> = Result<T, ReintroductionError>;

/// Map a constructor error into a `ConstructorFailure` with loop context
pub(crate) fn constructor_failure(
    phase: Phase,
    attempt: u32,
    operation: ConstructorOperation,
    record: Option<RecordId>,
) -> impl FnOnce(ConstructorError) -> ReintroductionError {
    move |source| ReintroductionError::ConstructorFailure {
        phase,
        attempt,
        operation,
        record,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ReintroductionError::precondition("x").code(),
            "PREFLEDGER_PRECONDITION_VIOLATION"
        );
        assert_eq!(
            ReintroductionError::ContractViolation {
                attempts: 3,
                removed: 3
            }
            .code(),
            "PREFLEDGER_CONTRACT_VIOLATION"
        );
    }

    #[test]
    fn test_only_contract_violation_is_fatal() {
        assert!(ReintroductionError::ContractViolation {
            attempts: 1,
            removed: 1
        }
        .is_fatal());
        assert!(!ReintroductionError::precondition("empty").is_fatal());
    }

    #[test]
    fn test_constructor_failure_display_carries_context() {
        let err = constructor_failure(
            Phase::Recover,
            4,
            ConstructorOperation::Build,
            Some(RecordId::new(7)),
        )(ConstructorError::BuildFailed("sampler diverged".into()));

        let display = err.to_string();
        assert!(display.contains("recover"));
        assert!(display.contains("attempt 4"));
        assert!(display.contains("#7"));
        assert!(display.contains("sampler diverged"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
