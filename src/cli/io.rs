//! JSON I/O handling for CLI
//!
//! - Input: one JSON object per line, from stdin or a file
//! - Output: one JSON object per line on stdout
//! - Logs and rendered reports go to stderr
//! - UTF-8 only

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::ledger::Statement;

use super::errors::{CliError, CliResult};

/// One input line: the statements elicited in one iteration
#[derive(Debug, Clone, Deserialize)]
pub struct IterationInput {
    pub statements: Vec<Statement>,
}

/// Open the input source: the file at `path`, or stdin
pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                CliError::io_error(format!("failed to open input {}: {}", path.display(), e))
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Parse iteration inputs line by line, skipping blank lines
pub fn read_iterations<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<IterationInput>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(serde_json::from_str(&line).map_err(|e| {
                CliError::invalid_input(format!("line {}: {}", index + 1, e))
            })),
            Err(e) => Some(Err(CliError::from(e))),
        })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(&response)
}

fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
