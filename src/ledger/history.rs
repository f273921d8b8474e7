//! Chronological statement ledger
//!
//! # Invariants
//!
//! - Records are ordered oldest to newest by iteration, ties by insertion
//! - Append-only, except for a wholesale `replace_with` after reintroduction
//! - Never reordered in place
//! - Record ids are never reused, even after a replacement

use super::errors::{LedgerError, LedgerResult};
use super::record::{RecordId, Statement, StatementRecord};

/// Append-only ledger of elicited statements.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<StatementRecord>,
    next_id: RecordId,
}

impl History {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement elicited in `iteration`.
    ///
    /// Fails if `iteration` is older than the newest record, since the ledger
    /// is never reordered.
    pub fn append(&mut self, statement: Statement, iteration: u32) -> LedgerResult<StatementRecord> {
        if let Some(newest) = self.newest_iteration() {
            if iteration < newest {
                return Err(LedgerError::IterationRegression {
                    iteration,
                    newest,
                });
            }
        }

        let record = StatementRecord::new(self.next_id, statement, iteration);
        self.next_id = self.next_id.next();
        self.records.push(record.clone());
        Ok(record)
    }

    /// Append a batch of statements elicited together in one iteration.
    ///
    /// The batch is rejected as a whole if the iteration regresses.
    pub fn append_all(
        &mut self,
        statements: impl IntoIterator<Item = Statement>,
        iteration: u32,
    ) -> LedgerResult<Vec<StatementRecord>> {
        if let Some(newest) = self.newest_iteration() {
            if iteration < newest {
                return Err(LedgerError::IterationRegression {
                    iteration,
                    newest,
                });
            }
        }

        statements
            .into_iter()
            .map(|statement| self.append(statement, iteration))
            .collect()
    }

    /// Independent oldest-to-newest copy of the ledger.
    pub fn chronological_copy(&self) -> Vec<StatementRecord> {
        self.records.clone()
    }

    /// Replace the whole ledger with an accepted subset.
    ///
    /// The replacement must be chronologically ordered and consist only of
    /// records this ledger issued.
    pub fn replace_with(&mut self, records: Vec<StatementRecord>) -> LedgerResult<()> {
        for record in &records {
            if record.id() >= self.next_id {
                return Err(LedgerError::ForeignRecord { id: record.id() });
            }
        }

        for pair in records.windows(2) {
            let (older, newer) = (&pair[0], &pair[1]);
            if !older.precedes(newer) || older.iteration() > newer.iteration() {
                return Err(LedgerError::Disordered {
                    older: older.id(),
                    newer: newer.id(),
                });
            }
        }

        self.records = records;
        Ok(())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the ledger holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &StatementRecord> {
        self.records.iter()
    }

    /// Look up a record by id
    pub fn get(&self, id: RecordId) -> Option<&StatementRecord> {
        // Ids are sorted, so a binary search is enough.
        self.records
            .binary_search_by_key(&id, |r| r.id())
            .ok()
            .map(|index| &self.records[index])
    }

    /// Iteration of the newest record, if any
    pub fn newest_iteration(&self) -> Option<u32> {
        self.records.last().map(|r| r.iteration())
    }
}
