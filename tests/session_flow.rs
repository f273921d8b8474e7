//! Session Flow Tests
//!
//! End-to-end iterations over the ordinal constructor:
//! - Consistent iterations keep every statement
//! - A preference cycle triggers reintroduction and shrinks the ledger
//! - Recovered records return to the ledger in chronological order
//! - Sessions built from the same seeded config produce the same models

use std::fs;
use std::path::PathBuf;

use prefledger::constructor::{OrdinalConstructor, Ranking};
use prefledger::ledger::{RecordId, Statement};
use prefledger::recovery::{InconsistencyHandler, RemoveOldest, RemoveOldestThenRecover};
use prefledger::session::{DecisionSession, SessionConfig, SessionError};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn prefer(a: &str, b: &str) -> Statement {
    Statement::prefer(a, b)
}

fn seeded_session() -> DecisionSession<OrdinalConstructor, RemoveOldestThenRecover> {
    DecisionSession::new(
        OrdinalConstructor::new(8, Some(11)),
        RemoveOldestThenRecover::with_dump_states(true),
    )
}

fn ledger_ids<C, H>(session: &DecisionSession<C, H>) -> Vec<RecordId>
where
    C: prefledger::constructor::ModelConstructor,
    H: InconsistencyHandler,
{
    session.history().iter().map(|r| r.id()).collect()
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("prefledger.json");
    fs::write(&path, body).unwrap();
    path
}

// =============================================================================
// Consistent Iterations
// =============================================================================

#[test]
fn test_consistent_iterations_accumulate() {
    let mut session = seeded_session();

    let first = session.elicit(vec![prefer("a", "b")]).unwrap();
    let second = session.elicit(vec![prefer("b", "c")]).unwrap();

    assert_eq!(first.iteration, 1);
    assert_eq!(second.iteration, 2);
    assert!(second.report.is_none());
    assert_eq!(
        second.outcome.models(),
        &[Ranking(vec!["a".into(), "b".into(), "c".into()])]
    );
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history().newest_iteration(), Some(2));
}

#[test]
fn test_empty_iteration_is_consistent() {
    let mut session = seeded_session();
    let result = session.elicit(Vec::new()).unwrap();

    assert!(!result.outcome.is_inconsistent());
    assert!(session.history().is_empty());
}

// =============================================================================
// Reintroduction
// =============================================================================

#[test]
fn test_cycle_drops_the_oldest_statement() {
    let mut session = seeded_session();
    session.elicit(vec![prefer("a", "b"), prefer("b", "c")]).unwrap();

    let result = session.elicit(vec![prefer("c", "a")]).unwrap();

    let report = result.report.expect("cycle must trigger reintroduction");
    assert_eq!(report.attempts, 1);
    assert_eq!(report.discarded, vec![RecordId::new(0)]);
    assert!(report.recovered.is_empty());
    assert_eq!(ledger_ids(&session), vec![RecordId::new(1), RecordId::new(2)]);

    for ranking in result.outcome.models() {
        assert!(ranking.position("b") < ranking.position("c"));
        assert!(ranking.position("c") < ranking.position("a"));
    }
}

#[test]
fn test_unrelated_old_statement_is_recovered() {
    let mut session = seeded_session();
    session.elicit(vec![prefer("x", "y")]).unwrap();
    session.elicit(vec![prefer("a", "b")]).unwrap();

    let result = session.elicit(vec![prefer("b", "a")]).unwrap();

    let report = result.report.unwrap();
    // [#1 #2] inc, [#2] ok, then #1 rejected and #0 re-admitted
    assert_eq!(report.attempts, 4);
    assert_eq!(report.recovered, vec![RecordId::new(0)]);
    assert_eq!(report.discarded, vec![RecordId::new(1)]);
    assert_eq!(report.states.len(), 5);
    assert_eq!(ledger_ids(&session), vec![RecordId::new(0), RecordId::new(2)]);

    let metrics = session.metrics();
    assert_eq!(metrics.reintroductions, 1);
    assert_eq!(metrics.constructor_probes, 4);
    assert_eq!(metrics.records_recovered, 1);
    assert_eq!(metrics.records_discarded, 1);
}

#[test]
fn test_remove_oldest_keeps_only_the_suffix() {
    let mut session = DecisionSession::new(OrdinalConstructor::new(4, Some(2)), RemoveOldest::new());
    session.elicit(vec![prefer("x", "y")]).unwrap();
    session.elicit(vec![prefer("a", "b")]).unwrap();

    session.elicit(vec![prefer("b", "a")]).unwrap();

    assert_eq!(ledger_ids(&session), vec![RecordId::new(2)]);
}

#[test]
fn test_reflexive_statement_is_discarded_alone() {
    let mut session = seeded_session();
    session.elicit(vec![prefer("a", "b")]).unwrap();

    let result = session.elicit(vec![prefer("c", "c")]).unwrap();

    // shrinking has to remove everything, then #0 is recovered
    let report = result.report.unwrap();
    assert_eq!(report.recovered, vec![RecordId::new(0)]);
    assert_eq!(report.discarded, vec![RecordId::new(1)]);
    assert_eq!(ledger_ids(&session), vec![RecordId::new(0)]);
}

#[test]
fn test_iterations_continue_after_reintroduction() {
    let mut session = seeded_session();
    session.elicit(vec![prefer("a", "b")]).unwrap();
    session.elicit(vec![prefer("b", "a")]).unwrap();

    let result = session.elicit(vec![prefer("c", "b")]).unwrap();

    assert_eq!(result.iteration, 3);
    assert!(result.report.is_none());
    assert_eq!(ledger_ids(&session), vec![RecordId::new(1), RecordId::new(2)]);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_session_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "handler": "remove_oldest",
            "model_samples": 6,
            "seed": 19,
            "criteria": [{"name": "price"}, {"name": "comfort", "gain": true}]
        }"#,
    );

    let config = SessionConfig::load(&path).unwrap();
    assert_eq!(config.criteria.len(), 2);
    assert!(config.criteria[1].gain);

    let session = DecisionSession::from_config(&config).unwrap();
    assert_eq!(session.handler().name(), "remove_oldest");
}

#[test]
fn test_same_seed_same_models() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"seed": 7, "model_samples": 12}"#);
    let config = SessionConfig::load(&path).unwrap();

    let answers = vec![prefer("a", "b"), prefer("c", "d"), prefer("e", "f")];
    let mut first = DecisionSession::from_config(&config).unwrap();
    let mut second = DecisionSession::from_config(&config).unwrap();

    let left = first.elicit(answers.clone()).unwrap();
    let right = second.elicit(answers).unwrap();
    assert_eq!(left.outcome.models(), right.outcome.models());
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"model_samples": 0}"#);

    let err = SessionConfig::load(&path).unwrap_err();
    assert!(matches!(err, SessionError::Config(_)));
    assert_eq!(err.code(), "PREFLEDGER_CONFIG_ERROR");
}

#[test]
fn test_missing_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let err = SessionConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("failed to read config"));
}
