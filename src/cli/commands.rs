//! CLI command implementations

use std::path::Path;

use serde_json::json;

use crate::observability::ObservationScope;
use crate::session::{DecisionSession, SessionConfig};

use super::args::Command;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{open_input, read_iterations, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Run {
            config,
            input,
            explain,
        } => run_session(&config, input.as_deref(), explain),
        Command::Validate { config } => validate(&config),
    }
}

/// Run one elicitation iteration per input line.
///
/// Every iteration produces exactly one response line. Malformed lines and
/// failed iterations are reported and skipped; a broken constructor contract
/// or an I/O failure stops the run.
pub fn run_session(config_path: &Path, input: Option<&Path>, explain: bool) -> CliResult<()> {
    let config = SessionConfig::load(config_path)?;
    let mut session = DecisionSession::from_config(&config)?;
    let reader = open_input(input)?;

    let scope = ObservationScope::with_fields("SESSION", &[("handler", &config.handler)]);
    let mut failed = 0usize;

    for parsed in read_iterations(reader) {
        let iteration_input = match parsed {
            Ok(parsed) => parsed,
            Err(e) if e.code() == &CliErrorCode::InvalidInput => {
                write_error(e.code_str(), e.message())?;
                failed += 1;
                continue;
            }
            Err(e) => {
                write_error(e.code_str(), e.message())?;
                scope.fail(e.message());
                return Err(e);
            }
        };

        match session.elicit(iteration_input.statements) {
            Ok(result) => {
                if explain {
                    if let Some(report) = &result.report {
                        eprint!("{}", report.render(0));
                    }
                }
                let ledger: Vec<_> = session.history().iter().collect();
                let mut data = result.to_json()?;
                data["ledger"] = serde_json::to_value(ledger)?;
                write_response(data)?;
            }
            Err(e) => {
                let fatal = e.is_fatal();
                let err = CliError::from(e);
                write_error(err.code_str(), err.message())?;
                if fatal {
                    scope.fail(err.message());
                    return Err(err);
                }
                failed += 1;
            }
        }
    }

    let metrics = session.metrics();
    scope.complete_with_fields(&[
        ("failed", &failed.to_string()),
        ("iterations", &metrics.iterations.to_string()),
        ("reintroductions", &metrics.reintroductions.to_string()),
        ("records_discarded", &metrics.records_discarded.to_string()),
        ("records_recovered", &metrics.records_recovered.to_string()),
    ]);

    if failed > 0 {
        return Err(CliError::invalid_input(format!(
            "{} input line(s) failed",
            failed
        )));
    }
    Ok(())
}

/// Load and validate a configuration file
pub fn validate(config_path: &Path) -> CliResult<()> {
    let config = SessionConfig::load(config_path)?;
    write_response(json!({
        "valid": true,
        "config": serde_json::to_value(&config)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_accepts_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefledger.json");
        fs::write(&path, "{}").unwrap();

        assert!(validate(&path).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_handler() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefledger.json");
        fs::write(&path, r#"{"handler": "coin_flip"}"#).unwrap();

        let err = validate(&path).unwrap_err();
        assert_eq!(err.code_str(), "PREFLEDGER_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_run_session_from_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("prefledger.json");
        fs::write(&config, r#"{"seed": 5, "model_samples": 4}"#).unwrap();

        let input = dir.path().join("answers.jsonl");
        fs::write(
            &input,
            concat!(
                "{\"statements\":[{\"preferred\":\"a\",\"over\":\"b\"}]}\n",
                "{\"statements\":[{\"preferred\":\"b\",\"over\":\"a\"}]}\n",
            ),
        )
        .unwrap();

        assert!(run_session(&config, Some(&input), false).is_ok());
    }

    #[test]
    fn test_run_session_counts_bad_lines() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("prefledger.json");
        fs::write(&config, "{}").unwrap();

        let input = dir.path().join("answers.jsonl");
        fs::write(&input, "{\"statements\": 3}\n").unwrap();

        let err = run_session(&config, Some(&input), false).unwrap_err();
        assert_eq!(err.code_str(), "PREFLEDGER_CLI_INVALID_INPUT");
    }
}
