//! CLI module for prefledger
//!
//! Provides command-line interface for:
//! - run: Drive a session over JSON-lines input
//! - validate: Check a configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command, run_session, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{open_input, read_iterations, write_error, write_response, IterationInput};
