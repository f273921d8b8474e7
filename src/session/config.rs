//! Session configuration
//!
//! JSON file; every field is optional:
//!
//! ```json
//! {
//!   "handler": "remove_oldest_then_recover",
//!   "dump_states": false,
//!   "model_samples": 16,
//!   "seed": 7,
//!   "criteria": [{"name": "cost"}, {"name": "quality", "gain": true}],
//!   "log_level": "warn"
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constructor::{OrdinalConstructor, DEFAULT_MODEL_SAMPLES};
use crate::context::Criterion;
use crate::observability::{log_event_with_fields, Event, Severity};
use crate::recovery::{ConfiguredHandler, RemoveOldestThenRecover};

use super::errors::{SessionError, SessionResult};

/// Configuration of a decision session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inconsistency handler name
    #[serde(default = "default_handler")]
    pub handler: String,

    /// Record every probed state in reintroduction reports
    #[serde(default)]
    pub dump_states: bool,

    /// Rankings sampled per constructor build
    #[serde(default = "default_model_samples")]
    pub model_samples: usize,

    /// RNG seed; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Criteria of the decision problem
    #[serde(default)]
    pub criteria: Vec<Criterion>,

    /// Minimum log severity
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_handler() -> String {
    RemoveOldestThenRecover::NAME.to_string()
}

fn default_model_samples() -> usize {
    DEFAULT_MODEL_SAMPLES
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handler: default_handler(),
            dump_states: false,
            model_samples: default_model_samples(),
            seed: None,
            criteria: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl SessionConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> SessionResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SessionError::config(format!("failed to read config: {}", e)))?;

        let config: SessionConfig = serde_json::from_str(&content)
            .map_err(|e| SessionError::config(format!("invalid config JSON: {}", e)))?;

        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("handler", &config.handler),
                ("path", &path.display().to_string()),
            ],
        );
        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> SessionResult<()> {
        if ConfiguredHandler::from_name(&self.handler, false).is_none() {
            return Err(SessionError::config(format!(
                "unknown handler '{}'",
                self.handler
            )));
        }

        if self.model_samples == 0 {
            return Err(SessionError::config("model_samples must be > 0"));
        }

        self.log_severity()?;

        let mut seen = HashSet::new();
        for criterion in &self.criteria {
            if !seen.insert(criterion.name.as_str()) {
                return Err(SessionError::config(format!(
                    "duplicate criterion '{}'",
                    criterion.name
                )));
            }
        }

        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> SessionResult<Severity> {
        self.log_level.parse().map_err(SessionError::config)
    }

    /// The configured inconsistency handler
    pub fn build_handler(&self) -> SessionResult<ConfiguredHandler> {
        ConfiguredHandler::from_name(&self.handler, self.dump_states)
            .ok_or_else(|| SessionError::config(format!("unknown handler '{}'", self.handler)))
    }

    /// The configured ordinal constructor
    pub fn build_constructor(&self) -> OrdinalConstructor {
        OrdinalConstructor::new(self.model_samples, self.seed)
    }
}
