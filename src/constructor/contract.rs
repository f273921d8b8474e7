//! Model constructor contract
//!
//! A model constructor is the black box that decides whether any member of a
//! preference-model family is compatible with a statement sequence, and if so
//! returns (a sample of) those models.
//!
//! # Contract
//!
//! - `clear_models` must precede any build that is not an incremental
//!   continuation of the immediately preceding build
//! - `notify_added_statements` / `notify_removed_statements` are hints; a
//!   constructor that cannot work incrementally falls back to a full rebuild
//! - `build` is deterministic given the same sequence and internal random state
//! - The empty sequence is always consistent. Every implementation used with
//!   an inconsistency handler must guarantee this.

use std::fmt;

use serde::Serialize;

use crate::ledger::StatementRecord;

use super::errors::ConstructorResult;

/// Operations of the constructor contract, used to tag failures and call logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConstructorOperation {
    ClearModels,
    NotifyAdded,
    NotifyRemoved,
    Build,
}

impl ConstructorOperation {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructorOperation::ClearModels => "clear_models",
            ConstructorOperation::NotifyAdded => "notify_added_statements",
            ConstructorOperation::NotifyRemoved => "notify_removed_statements",
            ConstructorOperation::Build => "build",
        }
    }
}

impl fmt::Display for ConstructorOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one `build` call.
///
/// Owned by whoever requested the build; read-only once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConstructionOutcome<M> {
    inconsistent: bool,
    models: Vec<M>,
    statements_considered: usize,
    samples_drawn: u64,
    elapsed_ms: f64,
}

impl<M> ConstructionOutcome<M> {
    /// A consistent outcome carrying the compatible models found
    pub fn consistent(models: Vec<M>, statements_considered: usize) -> Self {
        Self {
            inconsistent: false,
            models,
            statements_considered,
            samples_drawn: 0,
            elapsed_ms: 0.0,
        }
    }

    /// An outcome for which no compatible model exists
    pub fn inconsistent(statements_considered: usize) -> Self {
        Self {
            inconsistent: true,
            models: Vec::new(),
            statements_considered,
            samples_drawn: 0,
            elapsed_ms: 0.0,
        }
    }

    /// Attach the number of sampling draws the constructor performed
    pub fn with_samples_drawn(mut self, samples_drawn: u64) -> Self {
        self.samples_drawn = samples_drawn;
        self
    }

    /// Attach the build wall-clock time
    pub fn with_elapsed_ms(mut self, elapsed_ms: f64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// True if no compatible model exists
    pub fn is_inconsistent(&self) -> bool {
        self.inconsistent
    }

    /// Compatible models (empty when inconsistent)
    pub fn models(&self) -> &[M] {
        &self.models
    }

    /// Number of statements the build considered
    pub fn statements_considered(&self) -> usize {
        self.statements_considered
    }

    /// Sampling draws performed during the build
    pub fn samples_drawn(&self) -> u64 {
        self.samples_drawn
    }

    /// Build wall-clock time in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }
}

/// Black-box builder of compatible preference models.
pub trait ModelConstructor {
    /// A member of the preference-model family
    type Model: Clone + fmt::Debug + Serialize;

    /// Discard all cached compatible-model state
    fn clear_models(&mut self) -> ConstructorResult<()>;

    /// Hint that `records` were added to the sequence the next build will see
    fn notify_added_statements(&mut self, records: &[StatementRecord]) -> ConstructorResult<()>;

    /// Hint that `records` were removed from the sequence the next build will see
    fn notify_removed_statements(&mut self, records: &[StatementRecord])
        -> ConstructorResult<()>;

    /// Build the compatible models for a chronological statement sequence
    fn build(
        &mut self,
        statements: &[StatementRecord],
    ) -> ConstructorResult<ConstructionOutcome<Self::Model>>;
}
