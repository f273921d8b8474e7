//! Statement records
//!
//! A record binds one preference statement to the decision iteration in
//! which it was elicited. Records are created once by the ledger and never
//! mutated; copies of the ledger share record identities through `RecordId`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger-assigned identity of a statement record.
///
/// Ids are strictly increasing in elicitation order and never reused, so
/// comparing two ids is the same as comparing the records chronologically.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RecordId(u64);

impl RecordId {
    /// Create a record id from its raw value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pairwise preference statement: `preferred` is strictly better than `over`.
///
/// The consistency-reintroduction core never looks inside a statement; only
/// model constructors interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// Identifier of the preferred alternative
    pub preferred: String,
    /// Identifier of the alternative it is preferred over
    pub over: String,
}

impl Statement {
    /// Create a pairwise preference statement
    pub fn prefer(preferred: impl Into<String>, over: impl Into<String>) -> Self {
        Self {
            preferred: preferred.into(),
            over: over.into(),
        }
    }

    /// True if both sides name the same alternative
    pub fn is_reflexive(&self) -> bool {
        self.preferred == self.over
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {}", self.preferred, self.over)
    }
}

/// Immutable {statement, iteration} pair owned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    id: RecordId,
    statement: Statement,
    iteration: u32,
}

impl StatementRecord {
    pub(crate) fn new(id: RecordId, statement: Statement, iteration: u32) -> Self {
        Self {
            id,
            statement,
            iteration,
        }
    }

    /// Ledger identity
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// The elicited statement
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Decision iteration in which the statement was elicited
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// True if `self` was elicited before `other`
    pub fn precedes(&self, other: &StatementRecord) -> bool {
        self.id < other.id
    }
}

impl fmt::Display for StatementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [iteration {}] {}", self.id, self.iteration, self.statement)
    }
}
