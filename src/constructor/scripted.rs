//! Rule-driven constructor double
//!
//! `ScriptedConstructor` decides consistency from declared conflict sets of
//! record ids, or from an explicit queue of verdicts, and logs every contract
//! call in order. It is used by the crate's own tests and is public so that
//! drivers built on this crate can be tested the same way.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::ledger::{RecordId, StatementRecord};

use super::contract::{ConstructionOutcome, ConstructorOperation, ModelConstructor};
use super::errors::{ConstructorError, ConstructorResult};

/// One logged contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorCall {
    ClearModels,
    NotifyAdded(Vec<RecordId>),
    NotifyRemoved(Vec<RecordId>),
    Build(Vec<RecordId>),
}

/// Scripted verdict for one build call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Consistent,
    Inconsistent,
}

/// Deterministic constructor double.
///
/// Verdict order for a build: a queued scripted verdict if any remains, then
/// the conflict rule (inconsistent iff the sequence contains every member of
/// some conflict set). The empty sequence is consistent under the conflict
/// rule unless `violate_empty_sequence` was requested.
#[derive(Debug, Default)]
pub struct ScriptedConstructor {
    conflicts: Vec<BTreeSet<RecordId>>,
    script: VecDeque<Verdict>,
    empty_inconsistent: bool,
    fault: Option<(ConstructorOperation, usize)>,
    call_counts: HashMap<ConstructorOperation, usize>,
    calls: Vec<ConstructorCall>,
}

impl ScriptedConstructor {
    /// Constructor with no conflicts: every sequence is consistent
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a set of records that cannot all hold together
    pub fn with_conflict(mut self, ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.conflicts.push(ids.into_iter().collect());
        self
    }

    /// Queue verdicts consumed one per build call, ahead of the conflict rule
    pub fn with_verdicts(mut self, verdicts: impl IntoIterator<Item = Verdict>) -> Self {
        self.script.extend(verdicts);
        self
    }

    /// Report every sequence inconsistent, including the empty one.
    ///
    /// This breaks the constructor contract on purpose.
    pub fn violate_empty_sequence(mut self) -> Self {
        self.empty_inconsistent = true;
        self
    }

    /// Fail the `nth` (1-based) call of `operation`
    pub fn fail_on(mut self, operation: ConstructorOperation, nth: usize) -> Self {
        self.fault = Some((operation, nth));
        self
    }

    /// Every contract call made so far, in order
    pub fn calls(&self) -> &[ConstructorCall] {
        &self.calls
    }

    /// The sequences passed to `build`, in order
    pub fn built_sequences(&self) -> Vec<Vec<RecordId>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                ConstructorCall::Build(ids) => Some(ids.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of calls made to `operation`
    pub fn call_count(&self, operation: ConstructorOperation) -> usize {
        self.call_counts.get(&operation).copied().unwrap_or(0)
    }

    fn enter(&mut self, operation: ConstructorOperation) -> ConstructorResult<()> {
        let count = self.call_counts.entry(operation).or_insert(0);
        *count += 1;

        match self.fault {
            Some((op, nth)) if op == operation && nth == *count => Err(ConstructorError::Injected {
                operation,
                call: nth,
            }),
            _ => Ok(()),
        }
    }

    fn conflicts_with(&self, ids: &BTreeSet<RecordId>) -> bool {
        if ids.is_empty() {
            return self.empty_inconsistent;
        }
        self.empty_inconsistent || self.conflicts.iter().any(|c| c.is_subset(ids))
    }
}

fn ids_of(records: &[StatementRecord]) -> Vec<RecordId> {
    records.iter().map(|r| r.id()).collect()
}

impl ModelConstructor for ScriptedConstructor {
    type Model = Vec<RecordId>;

    fn clear_models(&mut self) -> ConstructorResult<()> {
        self.enter(ConstructorOperation::ClearModels)?;
        self.calls.push(ConstructorCall::ClearModels);
        Ok(())
    }

    fn notify_added_statements(&mut self, records: &[StatementRecord]) -> ConstructorResult<()> {
        self.enter(ConstructorOperation::NotifyAdded)?;
        self.calls.push(ConstructorCall::NotifyAdded(ids_of(records)));
        Ok(())
    }

    fn notify_removed_statements(
        &mut self,
        records: &[StatementRecord],
    ) -> ConstructorResult<()> {
        self.enter(ConstructorOperation::NotifyRemoved)?;
        self.calls.push(ConstructorCall::NotifyRemoved(ids_of(records)));
        Ok(())
    }

    fn build(
        &mut self,
        statements: &[StatementRecord],
    ) -> ConstructorResult<ConstructionOutcome<Self::Model>> {
        self.enter(ConstructorOperation::Build)?;
        let ids = ids_of(statements);
        self.calls.push(ConstructorCall::Build(ids.clone()));

        let inconsistent = match self.script.pop_front() {
            Some(verdict) => verdict == Verdict::Inconsistent,
            None => self.conflicts_with(&ids.iter().copied().collect()),
        };

        if inconsistent {
            Ok(ConstructionOutcome::inconsistent(statements.len()))
        } else {
            Ok(ConstructionOutcome::consistent(vec![ids], statements.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{History, Statement};

    fn history(n: usize) -> Vec<StatementRecord> {
        let mut history = History::new();
        for i in 0..n {
            history
                .append(Statement::prefer(format!("a{}", i), format!("b{}", i)), 0)
                .unwrap();
        }
        history.chronological_copy()
    }

    #[test]
    fn test_conflict_rule() {
        let records = history(3);
        let mut constructor =
            ScriptedConstructor::new().with_conflict([records[0].id(), records[2].id()]);

        assert!(constructor.build(&records).unwrap().is_inconsistent());
        assert!(!constructor.build(&records[1..]).unwrap().is_inconsistent());
        assert!(!constructor.build(&[]).unwrap().is_inconsistent());
    }

    #[test]
    fn test_verdicts_take_precedence() {
        let records = history(2);
        let mut constructor = ScriptedConstructor::new().with_verdicts([Verdict::Inconsistent]);

        assert!(constructor.build(&records).unwrap().is_inconsistent());
        assert!(!constructor.build(&records).unwrap().is_inconsistent());
    }

    #[test]
    fn test_fault_injection_on_nth_call() {
        let records = history(1);
        let mut constructor = ScriptedConstructor::new().fail_on(ConstructorOperation::Build, 2);

        assert!(constructor.build(&records).is_ok());
        let err = constructor.build(&records).unwrap_err();
        assert_eq!(
            err,
            ConstructorError::Injected {
                operation: ConstructorOperation::Build,
                call: 2
            }
        );
        assert_eq!(constructor.call_count(ConstructorOperation::Build), 2);
        assert_eq!(constructor.built_sequences().len(), 1);
    }

    #[test]
    fn test_call_log_order() {
        let records = history(2);
        let mut constructor = ScriptedConstructor::new();

        constructor.clear_models().unwrap();
        constructor.notify_removed_statements(&records[..1]).unwrap();
        constructor.build(&records[1..]).unwrap();

        assert_eq!(
            constructor.calls(),
            &[
                ConstructorCall::ClearModels,
                ConstructorCall::NotifyRemoved(vec![records[0].id()]),
                ConstructorCall::Build(vec![records[1].id()]),
            ]
        );
    }

    #[test]
    fn test_violating_double_rejects_empty_sequence() {
        let mut constructor = ScriptedConstructor::new().violate_empty_sequence();
        assert!(constructor.build(&[]).unwrap().is_inconsistent());
    }
}
