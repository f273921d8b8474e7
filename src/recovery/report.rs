//! Reintroduction audit trail
//!
//! `RecoveryState` captures one constructor probe; `RecoveryReport` is the
//! single output of a handler invocation. Both are plain data. The text
//! rendering is for diagnostics only and is not a stable format.

use std::fmt;

use serde::Serialize;

use crate::constructor::ConstructionOutcome;
use crate::ledger::{RecordId, StatementRecord};

/// One probed statement sequence and what the constructor made of it
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryState<M> {
    /// Constructor outcome for `statements`
    pub outcome: ConstructionOutcome<M>,
    /// The probed sequence, oldest first
    pub statements: Vec<StatementRecord>,
    /// Probe number; 0 is the infeasible input
    pub attempt_number: u32,
}

impl<M> RecoveryState<M> {
    /// Create a state
    pub fn new(
        outcome: ConstructionOutcome<M>,
        statements: Vec<StatementRecord>,
        attempt_number: u32,
    ) -> Self {
        Self {
            outcome,
            statements,
            attempt_number,
        }
    }

    /// Ids of the probed sequence, oldest first
    pub fn statement_ids(&self) -> Vec<RecordId> {
        self.statements.iter().map(|r| r.id()).collect()
    }

    /// Multi-line rendering, every line prefixed by `indent` spaces
    pub fn render(&self, indent: usize) -> String {
        let pad = " ".repeat(indent);
        let verdict = if self.outcome.is_inconsistent() {
            "inconsistent".to_string()
        } else {
            format!("consistent, {} model(s)", self.outcome.models().len())
        };

        let mut out = format!(
            "{}attempt {}: {}, {} statement(s)\n",
            pad,
            self.attempt_number,
            verdict,
            self.statements.len()
        );
        for record in &self.statements {
            out.push_str(&format!("{}  {}\n", pad, record));
        }
        out
    }
}

/// Output of one reintroduction call
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryReport<M> {
    /// Name of the handler that produced the report
    pub handler: &'static str,
    /// Number of constructor builds performed
    pub attempts: u32,
    /// Every probed state, present only when state dumping is enabled
    pub states: Vec<RecoveryState<M>>,
    /// The accepted consistent state
    pub consistent_state: RecoveryState<M>,
    /// Wall-clock time of the whole invocation
    pub processing_time_ms: f64,
    /// Records dropped permanently, oldest first
    pub discarded: Vec<RecordId>,
    /// Records removed while shrinking and re-admitted afterwards
    pub recovered: Vec<RecordId>,
}

impl<M> RecoveryReport<M> {
    /// The accepted statement subset, oldest first
    pub fn accepted_statements(&self) -> &[StatementRecord] {
        &self.consistent_state.statements
    }

    /// Multi-line rendering, every line prefixed by `indent` spaces
    pub fn render(&self, indent: usize) -> String {
        let pad = " ".repeat(indent);
        let mut out = format!("{}Recovery report ({})\n", pad, self.handler);
        out.push_str(&format!("{}  attempts: {}\n", pad, self.attempts));
        out.push_str(&format!(
            "{}  processing time: {:.3} ms\n",
            pad, self.processing_time_ms
        ));
        out.push_str(&format!("{}  discarded: {}\n", pad, render_ids(&self.discarded)));
        out.push_str(&format!("{}  recovered: {}\n", pad, render_ids(&self.recovered)));
        out.push_str(&format!("{}  consistent state:\n", pad));
        out.push_str(&self.consistent_state.render(indent + 4));

        if !self.states.is_empty() {
            out.push_str(&format!("{}  states ({}):\n", pad, self.states.len()));
            for state in &self.states {
                out.push_str(&state.render(indent + 4));
            }
        }
        out
    }
}

impl<M: Serialize> RecoveryReport<M> {
    /// JSON form of the report, for the CLI
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl<M> fmt::Display for RecoveryReport<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(0))
    }
}

fn render_ids(ids: &[RecordId]) -> String {
    let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", joined.join(", "))
}
