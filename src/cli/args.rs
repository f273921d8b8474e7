//! CLI argument definitions using clap
//!
//! Commands:
//! - prefledger run --config <path> [--input <path>] [--explain]
//! - prefledger validate --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// prefledger - preference elicitation with consistency reintroduction
#[derive(Parser, Debug)]
#[command(name = "prefledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one elicitation iteration per input line
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "./prefledger.json")]
        config: PathBuf,

        /// JSON-lines input file; stdin when absent
        #[arg(long)]
        input: Option<PathBuf>,

        /// Write rendered recovery reports to stderr
        #[arg(long)]
        explain: bool,
    },

    /// Load and validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./prefledger.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
