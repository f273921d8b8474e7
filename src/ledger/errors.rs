//! Ledger error types

use thiserror::Error;

use super::record::RecordId;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised by the statement ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A statement was appended with an iteration older than the newest record
    #[error("iteration {iteration} precedes newest recorded iteration {newest}")]
    IterationRegression { iteration: u32, newest: u32 },

    /// A replacement sequence is not in chronological order
    #[error("replacement places {older} before {newer} out of chronological order")]
    Disordered { older: RecordId, newer: RecordId },

    /// A replacement sequence contains a record this ledger never issued
    #[error("record {id} was not issued by this ledger")]
    ForeignRecord { id: RecordId },
}

impl LedgerError {
    /// Returns the string error code
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::IterationRegression { .. } => "PREFLEDGER_LEDGER_ITERATION_REGRESSION",
            LedgerError::Disordered { .. } => "PREFLEDGER_LEDGER_DISORDERED",
            LedgerError::ForeignRecord { .. } => "PREFLEDGER_LEDGER_FOREIGN_RECORD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_records() {
        let err = LedgerError::Disordered {
            older: RecordId::new(4),
            newer: RecordId::new(2),
        };
        let display = err.to_string();
        assert!(display.contains("#4"));
        assert!(display.contains("#2"));
        assert_eq!(err.code(), "PREFLEDGER_LEDGER_DISORDERED");
    }
}
