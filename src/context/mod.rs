//! Decision context
//!
//! An immutable per-iteration snapshot of the decision problem (criteria and
//! an optional random seed) handed to an inconsistency handler for the
//! duration of one invocation.
//!
//! # Lifecycle
//!
//! `register` and `unregister` strictly bracket every reintroduction call.
//! Registering twice without unregistering is a precondition violation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};

/// A decision criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion name
    pub name: String,
    /// True if larger values are better
    #[serde(default)]
    pub gain: bool,
}

impl Criterion {
    /// A criterion to be minimized
    pub fn cost(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gain: false,
        }
    }

    /// A criterion to be maximized
    pub fn gain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gain: true,
        }
    }
}

/// Immutable snapshot of one decision iteration
#[derive(Debug, Clone, Serialize)]
pub struct DecisionContext {
    id: Uuid,
    iteration: u32,
    criteria: Vec<Criterion>,
    seed: Option<u64>,
    created_at: DateTime<Utc>,
}

impl DecisionContext {
    /// Create a context for `iteration`
    pub fn new(iteration: u32, criteria: Vec<Criterion>) -> Self {
        Self {
            id: Uuid::new_v4(),
            iteration,
            criteria,
            seed: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Context id, for correlating log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Decision iteration
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Criteria of the decision problem
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Optional random seed
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Holder for the context registered with a handler.
///
/// Returned errors are plain strings; callers wrap them in their own error
/// kind.
#[derive(Debug, Default)]
pub struct ContextSlot {
    current: Option<DecisionContext>,
}

impl ContextSlot {
    /// Empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `context`; fails if one is already registered
    pub fn register(&mut self, context: DecisionContext) -> Result<(), String> {
        if let Some(existing) = &self.current {
            return Err(format!(
                "decision context {} is already registered",
                existing.id()
            ));
        }

        log_event_with_fields(
            Event::ContextRegistered,
            &[
                ("context_id", &context.id().to_string()),
                ("iteration", &context.iteration().to_string()),
            ],
        );
        self.current = Some(context);
        Ok(())
    }

    /// Unregister the current context, returning it if there was one
    pub fn unregister(&mut self) -> Option<DecisionContext> {
        let previous = self.current.take();
        if let Some(context) = &previous {
            log_event_with_fields(
                Event::ContextUnregistered,
                &[("context_id", &context.id().to_string())],
            );
        }
        previous
    }

    /// The registered context, if any
    pub fn current(&self) -> Option<&DecisionContext> {
        self.current.as_ref()
    }
}
