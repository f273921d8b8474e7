//! Inconsistency handlers
//!
//! Both handlers restore feasibility of an infeasible statement sequence by
//! removing the oldest statements first:
//!
//! 1. Shrink: remove the single oldest remaining record, rebuild, repeat
//!    until the constructor reports consistency
//! 2. Recover (RemoveOldestThenRecover only): re-admit the removed records
//!    newest-removed first, keeping each one that leaves the sequence
//!    consistent and dropping each one that does not
//!
//! Every probe is one `build` call; `clear_models` precedes any build that
//! does not continue the immediately preceding one incrementally.

use std::collections::VecDeque;
use std::slice;

use crate::constructor::{ConstructionOutcome, ConstructorOperation, ModelConstructor};
use crate::context::{ContextSlot, DecisionContext};
use crate::ledger::{RecordId, StatementRecord};
use crate::observability::{log_event_with_fields, trace_event, Event, ObservationScope, Timer};

use super::errors::{constructor_failure, Phase, ReintroductionError, ReintroductionResult};
use super::report::{RecoveryReport, RecoveryState};

/// Strategy for making an infeasible statement sequence consistent again
pub trait InconsistencyHandler {
    /// Stable handler name, used in reports and configuration
    fn name(&self) -> &'static str;

    /// Register the decision context for the next invocation
    fn register_decision_context(&mut self, context: DecisionContext) -> ReintroductionResult<()>;

    /// Release the registered decision context
    fn unregister_decision_context(&mut self) -> Option<DecisionContext>;

    /// Find a consistent subsequence of `statements`.
    ///
    /// `infeasible_outcome` must be the inconsistent outcome the constructor
    /// produced for exactly `statements`, and a decision context must be
    /// registered.
    fn reintroduce_consistency<C: ModelConstructor>(
        &mut self,
        infeasible_outcome: ConstructionOutcome<C::Model>,
        constructor: &mut C,
        statements: &[StatementRecord],
    ) -> ReintroductionResult<RecoveryReport<C::Model>>;
}

/// Remove the oldest statements until consistent, then try to re-admit them
/// newest-removed first.
#[derive(Debug, Default)]
pub struct RemoveOldestThenRecover {
    slot: ContextSlot,
    dump_states: bool,
}

impl RemoveOldestThenRecover {
    pub const NAME: &'static str = "remove_oldest_then_recover";

    /// Handler that keeps only the accepted state in its reports
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that records every probed state when `dump_states` is set
    pub fn with_dump_states(dump_states: bool) -> Self {
        Self {
            slot: ContextSlot::new(),
            dump_states,
        }
    }
}

impl InconsistencyHandler for RemoveOldestThenRecover {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn register_decision_context(&mut self, context: DecisionContext) -> ReintroductionResult<()> {
        self.slot
            .register(context)
            .map_err(ReintroductionError::precondition)
    }

    fn unregister_decision_context(&mut self) -> Option<DecisionContext> {
        self.slot.unregister()
    }

    fn reintroduce_consistency<C: ModelConstructor>(
        &mut self,
        infeasible_outcome: ConstructionOutcome<C::Model>,
        constructor: &mut C,
        statements: &[StatementRecord],
    ) -> ReintroductionResult<RecoveryReport<C::Model>> {
        reintroduce(
            Self::NAME,
            &self.slot,
            self.dump_states,
            true,
            infeasible_outcome,
            constructor,
            statements,
        )
    }
}

/// Remove the oldest statements until consistent; never re-admit any.
#[derive(Debug, Default)]
pub struct RemoveOldest {
    slot: ContextSlot,
    dump_states: bool,
}

impl RemoveOldest {
    pub const NAME: &'static str = "remove_oldest";

    /// Handler that keeps only the accepted state in its reports
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that records every probed state when `dump_states` is set
    pub fn with_dump_states(dump_states: bool) -> Self {
        Self {
            slot: ContextSlot::new(),
            dump_states,
        }
    }
}

impl InconsistencyHandler for RemoveOldest {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn register_decision_context(&mut self, context: DecisionContext) -> ReintroductionResult<()> {
        self.slot
            .register(context)
            .map_err(ReintroductionError::precondition)
    }

    fn unregister_decision_context(&mut self) -> Option<DecisionContext> {
        self.slot.unregister()
    }

    fn reintroduce_consistency<C: ModelConstructor>(
        &mut self,
        infeasible_outcome: ConstructionOutcome<C::Model>,
        constructor: &mut C,
        statements: &[StatementRecord],
    ) -> ReintroductionResult<RecoveryReport<C::Model>> {
        reintroduce(
            Self::NAME,
            &self.slot,
            self.dump_states,
            false,
            infeasible_outcome,
            constructor,
            statements,
        )
    }
}

/// Handler chosen at runtime, e.g. from configuration
#[derive(Debug)]
pub enum ConfiguredHandler {
    RemoveOldest(RemoveOldest),
    RemoveOldestThenRecover(RemoveOldestThenRecover),
}

impl ConfiguredHandler {
    /// Build the handler registered under `name`
    pub fn from_name(name: &str, dump_states: bool) -> Option<Self> {
        match name {
            RemoveOldest::NAME => Some(ConfiguredHandler::RemoveOldest(
                RemoveOldest::with_dump_states(dump_states),
            )),
            RemoveOldestThenRecover::NAME => Some(ConfiguredHandler::RemoveOldestThenRecover(
                RemoveOldestThenRecover::with_dump_states(dump_states),
            )),
            _ => None,
        }
    }
}

impl InconsistencyHandler for ConfiguredHandler {
    fn name(&self) -> &'static str {
        match self {
            ConfiguredHandler::RemoveOldest(h) => h.name(),
            ConfiguredHandler::RemoveOldestThenRecover(h) => h.name(),
        }
    }

    fn register_decision_context(&mut self, context: DecisionContext) -> ReintroductionResult<()> {
        match self {
            ConfiguredHandler::RemoveOldest(h) => h.register_decision_context(context),
            ConfiguredHandler::RemoveOldestThenRecover(h) => h.register_decision_context(context),
        }
    }

    fn unregister_decision_context(&mut self) -> Option<DecisionContext> {
        match self {
            ConfiguredHandler::RemoveOldest(h) => h.unregister_decision_context(),
            ConfiguredHandler::RemoveOldestThenRecover(h) => h.unregister_decision_context(),
        }
    }

    fn reintroduce_consistency<C: ModelConstructor>(
        &mut self,
        infeasible_outcome: ConstructionOutcome<C::Model>,
        constructor: &mut C,
        statements: &[StatementRecord],
    ) -> ReintroductionResult<RecoveryReport<C::Model>> {
        match self {
            ConfiguredHandler::RemoveOldest(h) => {
                h.reintroduce_consistency(infeasible_outcome, constructor, statements)
            }
            ConfiguredHandler::RemoveOldestThenRecover(h) => {
                h.reintroduce_consistency(infeasible_outcome, constructor, statements)
            }
        }
    }
}

fn reintroduce<C: ModelConstructor>(
    handler: &'static str,
    slot: &ContextSlot,
    dump_states: bool,
    recover: bool,
    infeasible_outcome: ConstructionOutcome<C::Model>,
    constructor: &mut C,
    statements: &[StatementRecord],
) -> ReintroductionResult<RecoveryReport<C::Model>> {
    let timer = Timer::new();

    let context = slot
        .current()
        .ok_or_else(|| ReintroductionError::precondition("no decision context registered"))?;
    if !infeasible_outcome.is_inconsistent() {
        return Err(ReintroductionError::precondition(
            "outcome handed to the handler is not inconsistent",
        ));
    }
    if statements.is_empty() {
        return Err(ReintroductionError::precondition(
            "statement sequence is empty",
        ));
    }
    if let Some(pair) = statements.windows(2).find(|p| !p[0].precedes(&p[1])) {
        return Err(ReintroductionError::precondition(format!(
            "statements are not chronological: {} before {}",
            pair[0].id(),
            pair[1].id()
        )));
    }

    let context_id = context.id().to_string();
    let scope = ObservationScope::with_fields(
        "REINTRODUCTION",
        &[("context_id", &context_id), ("handler", handler)],
    );

    let mut run = Run::new(constructor, dump_states, infeasible_outcome, statements);
    let result = run.shrink().and_then(|first_was_causing| {
        // A single removal that alone restored consistency leaves nothing
        // worth re-admitting.
        if recover && !(run.removed.len() == 1 && first_was_causing) {
            run.recover()
        } else {
            Ok(())
        }
    });

    match result {
        Ok(()) => {
            let report = run.finish(handler, timer.elapsed_ms_f64());
            scope.complete_with_fields(&[
                ("attempts", &report.attempts.to_string()),
                ("discarded", &report.discarded.len().to_string()),
                ("recovered", &report.recovered.len().to_string()),
                ("elapsed_ms", &timer.elapsed_ms()),
            ]);
            Ok(report)
        }
        Err(err) => {
            if err.is_fatal() {
                log_event_with_fields(
                    Event::ContractViolation,
                    &[("context_id", &context_id), ("handler", handler)],
                );
            }
            scope.fail(&err.to_string());
            Err(err)
        }
    }
}

/// Mutable state of one invocation
struct Run<'c, C: ModelConstructor> {
    constructor: &'c mut C,
    dump_states: bool,
    attempt: u32,
    working: VecDeque<StatementRecord>,
    removed: VecDeque<StatementRecord>,
    current: ConstructionOutcome<C::Model>,
    states: Vec<RecoveryState<C::Model>>,
    accepted: Option<RecoveryState<C::Model>>,
    discarded: Vec<RecordId>,
    recovered: Vec<RecordId>,
}

impl<'c, C: ModelConstructor> Run<'c, C> {
    fn new(
        constructor: &'c mut C,
        dump_states: bool,
        infeasible_outcome: ConstructionOutcome<C::Model>,
        statements: &[StatementRecord],
    ) -> Self {
        let mut states = Vec::new();
        if dump_states {
            states.push(RecoveryState::new(
                infeasible_outcome.clone(),
                statements.to_vec(),
                0,
            ));
        }

        Self {
            constructor,
            dump_states,
            attempt: 0,
            working: statements.iter().cloned().collect(),
            removed: VecDeque::new(),
            current: infeasible_outcome,
            states,
            accepted: None,
            discarded: Vec::new(),
            recovered: Vec::new(),
        }
    }

    fn working_copy(&self) -> Vec<StatementRecord> {
        self.working.iter().cloned().collect()
    }

    fn trace(&mut self, outcome: &ConstructionOutcome<C::Model>, statements: &[StatementRecord]) {
        if self.dump_states {
            self.states.push(RecoveryState::new(
                outcome.clone(),
                statements.to_vec(),
                self.attempt,
            ));
        }
    }

    /// Remove the oldest record until the constructor reports consistency.
    ///
    /// Returns true if the very first removal alone restored consistency.
    fn shrink(&mut self) -> ReintroductionResult<bool> {
        let mut first_was_causing = false;

        while self.current.is_inconsistent() {
            let Some(oldest) = self.working.pop_front() else {
                return Err(ReintroductionError::ContractViolation {
                    attempts: self.attempt,
                    removed: self.removed.len(),
                });
            };
            let id = Some(oldest.id());

            self.attempt += 1;
            self.constructor
                .clear_models()
                .map_err(constructor_failure(
                    Phase::Shrink,
                    self.attempt,
                    ConstructorOperation::ClearModels,
                    id,
                ))?;

            self.constructor
                .notify_removed_statements(slice::from_ref(&oldest))
                .map_err(constructor_failure(
                    Phase::Shrink,
                    self.attempt,
                    ConstructorOperation::NotifyRemoved,
                    id,
                ))?;
            self.removed.push_back(oldest);

            let sequence = self.working_copy();
            let outcome = self
                .constructor
                .build(&sequence)
                .map_err(constructor_failure(
                    Phase::Shrink,
                    self.attempt,
                    ConstructorOperation::Build,
                    id,
                ))?;

            trace_event(
                Event::ShrinkProbe,
                &[
                    ("attempt", &self.attempt.to_string()),
                    ("inconsistent", &outcome.is_inconsistent().to_string()),
                    ("remaining", &sequence.len().to_string()),
                    ("removed", &record_label(id)),
                ],
            );
            self.trace(&outcome, &sequence);

            if self.attempt == 1 && !outcome.is_inconsistent() {
                first_was_causing = true;
            }
            self.current = outcome;
        }

        self.accepted = Some(RecoveryState::new(
            self.current.clone(),
            self.working_copy(),
            self.attempt,
        ));
        Ok(first_was_causing)
    }

    /// Try every removed record once, newest-removed first.
    fn recover(&mut self) -> ReintroductionResult<()> {
        let to_recover = self.removed.len();
        // After a rejected probe the constructor cache holds a sequence that
        // was abandoned, so the next build cannot continue from it.
        let mut cache_abandoned = false;

        for _ in 0..to_recover {
            let Some(candidate) = self.removed.pop_back() else {
                break;
            };
            let id = Some(candidate.id());
            self.attempt += 1;

            if cache_abandoned {
                self.constructor
                    .clear_models()
                    .map_err(constructor_failure(
                        Phase::Recover,
                        self.attempt,
                        ConstructorOperation::ClearModels,
                        id,
                    ))?;
            }

            // Only an oldest prefix was ever removed, so this is the front.
            let position = self.working.partition_point(|r| r.precedes(&candidate));
            let mut sequence = self.working_copy();
            sequence.insert(position, candidate.clone());

            self.constructor
                .notify_added_statements(slice::from_ref(&candidate))
                .map_err(constructor_failure(
                    Phase::Recover,
                    self.attempt,
                    ConstructorOperation::NotifyAdded,
                    id,
                ))?;

            let probe = self
                .constructor
                .build(&sequence)
                .map_err(constructor_failure(
                    Phase::Recover,
                    self.attempt,
                    ConstructorOperation::Build,
                    id,
                ))?;

            trace_event(
                Event::RecoverProbe,
                &[
                    ("attempt", &self.attempt.to_string()),
                    ("candidate", &record_label(id)),
                    ("inconsistent", &probe.is_inconsistent().to_string()),
                ],
            );
            self.trace(&probe, &sequence);

            if probe.is_inconsistent() {
                trace_event(Event::CandidateRejected, &[("candidate", &record_label(id))]);
                self.discarded.push(candidate.id());
                cache_abandoned = true;
            } else {
                trace_event(Event::CandidateAccepted, &[("candidate", &record_label(id))]);
                self.working.insert(position, candidate.clone());
                self.recovered.push(candidate.id());
                self.accepted = Some(RecoveryState::new(probe.clone(), sequence, self.attempt));
                self.current = probe;
                cache_abandoned = false;
            }
        }

        Ok(())
    }

    fn finish(mut self, handler: &'static str, processing_time_ms: f64) -> RecoveryReport<C::Model> {
        // Whatever recovery did not reach stays discarded, oldest first.
        let mut discarded: Vec<RecordId> = self.removed.iter().map(|r| r.id()).collect();
        discarded.append(&mut self.discarded);
        discarded.sort();

        let consistent_state = self.accepted.take().unwrap_or_else(|| {
            RecoveryState::new(self.current.clone(), self.working_copy(), self.attempt)
        });

        RecoveryReport {
            handler,
            attempts: self.attempt,
            states: self.states,
            consistent_state,
            processing_time_ms,
            discarded,
            recovered: self.recovered,
        }
    }
}

fn record_label(id: Option<RecordId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}
