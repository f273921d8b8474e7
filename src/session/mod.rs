//! Elicitation session driver
//!
//! A session owns the statement ledger and runs one elicitation iteration
//! per `elicit` call.
//!
//! # Sequence (strict order)
//!
//! 1. Append the new statements to the ledger as one batch
//! 2. Clear constructor caches, notify the additions, build
//! 3. If inconsistent: register a fresh decision context, reintroduce
//!    consistency, unregister the context (on success and on error alike),
//!    replace the ledger with the accepted subset
//!
//! A failed reintroduction leaves the ledger holding the appended but
//! infeasible statements.

mod config;
mod errors;

pub use config::SessionConfig;
pub use errors::{SessionError, SessionResult};

use serde::Serialize;

use crate::constructor::{ConstructionOutcome, ModelConstructor, OrdinalConstructor};
use crate::context::{Criterion, DecisionContext};
use crate::ledger::{History, Statement};
use crate::observability::{
    log_event_with_fields, Event, Logger, MetricsRegistry, MetricsSnapshot, ObservationScope,
};
use crate::recovery::{ConfiguredHandler, InconsistencyHandler, RecoveryReport};

/// Result of one elicitation iteration
#[derive(Debug, Clone, Serialize)]
pub struct IterationOutcome<M> {
    /// Iteration number, starting at 1
    pub iteration: u32,
    /// Outcome for the ledger as it stands after the iteration
    pub outcome: ConstructionOutcome<M>,
    /// Present when the new statements made the ledger inconsistent
    pub report: Option<RecoveryReport<M>>,
}

impl<M: Serialize> IterationOutcome<M> {
    /// JSON form, for the CLI
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Drives elicitation iterations over one ledger
#[derive(Debug)]
pub struct DecisionSession<C, H> {
    history: History,
    constructor: C,
    handler: H,
    criteria: Vec<Criterion>,
    seed: Option<u64>,
    iteration: u32,
    metrics: MetricsRegistry,
}

impl<C: ModelConstructor, H: InconsistencyHandler> DecisionSession<C, H> {
    /// Session with an empty ledger
    pub fn new(constructor: C, handler: H) -> Self {
        Self {
            history: History::new(),
            constructor,
            handler,
            criteria: Vec::new(),
            seed: None,
            iteration: 0,
            metrics: MetricsRegistry::new(),
        }
    }

    /// Criteria handed to every decision context
    pub fn with_criteria(mut self, criteria: Vec<Criterion>) -> Self {
        self.criteria = criteria;
        self
    }

    /// Seed handed to every decision context
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Run one elicitation iteration with the statements given in it
    pub fn elicit(&mut self, statements: Vec<Statement>) -> SessionResult<IterationOutcome<C::Model>> {
        self.iteration += 1;
        let iteration = self.iteration;
        let iteration_label = iteration.to_string();
        let scope = ObservationScope::with_fields("ITERATION", &[("iteration", &iteration_label)]);

        match self.run_iteration(iteration, statements) {
            Ok(result) => {
                scope.complete_with_fields(&[
                    ("inconsistent", &result.outcome.is_inconsistent().to_string()),
                    ("ledger_len", &self.history.len().to_string()),
                    ("reintroduced", &result.report.is_some().to_string()),
                ]);
                Ok(result)
            }
            Err(err) => {
                scope.fail(&err.to_string());
                Err(err)
            }
        }
    }

    fn run_iteration(
        &mut self,
        iteration: u32,
        statements: Vec<Statement>,
    ) -> SessionResult<IterationOutcome<C::Model>> {
        let added = self.history.append_all(statements, iteration)?;
        self.metrics.increment_iterations();
        self.metrics.add_statements_elicited(added.len() as u64);

        self.constructor.clear_models()?;
        self.constructor.notify_added_statements(&added)?;
        let sequence = self.history.chronological_copy();
        let outcome = self.constructor.build(&sequence)?;

        if !outcome.is_inconsistent() {
            return Ok(IterationOutcome {
                iteration,
                outcome,
                report: None,
            });
        }

        let mut context = DecisionContext::new(iteration, self.criteria.clone());
        if let Some(seed) = self.seed {
            context = context.with_seed(seed);
        }
        self.handler.register_decision_context(context)?;
        let result = self
            .handler
            .reintroduce_consistency(outcome, &mut self.constructor, &sequence);
        self.handler.unregister_decision_context();

        let report = match result {
            Ok(report) => report,
            Err(err) => {
                self.metrics.increment_reintroduction_failures();
                return Err(err.into());
            }
        };

        self.metrics.record_reintroduction(
            u64::from(report.attempts),
            report.discarded.len() as u64,
            report.recovered.len() as u64,
        );

        let before = self.history.len();
        self.history.replace_with(report.accepted_statements().to_vec())?;
        log_event_with_fields(
            Event::HistoryReplaced,
            &[
                ("after", &self.history.len().to_string()),
                ("before", &before.to_string()),
                ("iteration", &iteration.to_string()),
            ],
        );

        Ok(IterationOutcome {
            iteration,
            outcome: report.consistent_state.outcome.clone(),
            report: Some(report),
        })
    }

    /// The statement ledger
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The model constructor
    pub fn constructor(&self) -> &C {
        &self.constructor
    }

    /// The inconsistency handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Number of iterations started so far
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Snapshot of the session counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl DecisionSession<OrdinalConstructor, ConfiguredHandler> {
    /// Session built from configuration.
    ///
    /// Also applies the configured log level process-wide.
    pub fn from_config(config: &SessionConfig) -> SessionResult<Self> {
        config.validate()?;
        Logger::set_min_severity(config.log_severity()?);

        Ok(Self::new(config.build_constructor(), config.build_handler()?)
            .with_criteria(config.criteria.clone())
            .with_seed(config.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::{ConstructorCall, ConstructorOperation, ScriptedConstructor};
    use crate::ledger::RecordId;
    use crate::recovery::{RemoveOldestThenRecover, ReintroductionError};

    fn prefer(a: &str, b: &str) -> Statement {
        Statement::prefer(a, b)
    }

    #[test]
    fn test_consistent_iteration_keeps_everything() {
        let mut session =
            DecisionSession::new(ScriptedConstructor::new(), RemoveOldestThenRecover::new());

        let result = session.elicit(vec![prefer("a", "b"), prefer("b", "c")]).unwrap();

        assert_eq!(result.iteration, 1);
        assert!(!result.outcome.is_inconsistent());
        assert!(result.report.is_none());
        assert_eq!(session.history().len(), 2);
        assert_eq!(
            session.constructor().calls(),
            &[
                ConstructorCall::ClearModels,
                ConstructorCall::NotifyAdded(vec![RecordId::new(0), RecordId::new(1)]),
                ConstructorCall::Build(vec![RecordId::new(0), RecordId::new(1)]),
            ]
        );
    }

    #[test]
    fn test_inconsistent_iteration_replaces_history() {
        let constructor = ScriptedConstructor::new().with_conflict([RecordId::new(0), RecordId::new(2)]);
        let mut session = DecisionSession::new(constructor, RemoveOldestThenRecover::new());

        session.elicit(vec![prefer("a", "b"), prefer("c", "d")]).unwrap();
        let result = session.elicit(vec![prefer("b", "a")]).unwrap();

        let report = result.report.unwrap();
        assert_eq!(report.discarded, vec![RecordId::new(0)]);
        let ids: Vec<RecordId> = session.history().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![RecordId::new(1), RecordId::new(2)]);
        assert!(!result.outcome.is_inconsistent());

        let metrics = session.metrics();
        assert_eq!(metrics.iterations, 2);
        assert_eq!(metrics.statements_elicited, 3);
        assert_eq!(metrics.reintroductions, 1);
        assert_eq!(metrics.records_discarded, 1);
    }

    #[test]
    fn test_context_unregistered_after_failure() {
        let constructor = ScriptedConstructor::new()
            .with_conflict([RecordId::new(0)])
            .fail_on(ConstructorOperation::Build, 2);
        let mut session = DecisionSession::new(constructor, RemoveOldestThenRecover::new());

        let err = session.elicit(vec![prefer("a", "b")]).unwrap_err();

        assert!(matches!(
            err,
            SessionError::Reintroduction(ReintroductionError::ConstructorFailure { .. })
        ));
        assert_eq!(session.metrics().reintroduction_failures, 1);
        // The ledger keeps the appended statement
        assert_eq!(session.history().len(), 1);
        assert!(session.handler.unregister_decision_context().is_none());
    }

    #[test]
    fn test_initial_build_failure_surfaces_constructor_error() {
        let constructor = ScriptedConstructor::new().fail_on(ConstructorOperation::Build, 1);
        let mut session = DecisionSession::new(constructor, RemoveOldestThenRecover::new());

        let err = session.elicit(vec![prefer("a", "b")]).unwrap_err();
        assert!(matches!(err, SessionError::Constructor(_)));
    }

    #[test]
    fn test_from_config() {
        let config = SessionConfig {
            handler: "remove_oldest".into(),
            seed: Some(3),
            ..Default::default()
        };
        let session = DecisionSession::from_config(&config).unwrap();
        assert_eq!(session.handler().name(), "remove_oldest");
        assert_eq!(session.iteration(), 0);
    }
}
