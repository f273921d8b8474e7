//! Model constructor contract and reference constructors
//!
//! The consistency-reintroduction core treats model construction as a black
//! box reached only through `ModelConstructor`. Two implementations ship
//! with the crate:
//!
//! - `OrdinalConstructor`: pairwise preferences, ranking models
//! - `ScriptedConstructor`: deterministic rule-driven double with a call log

mod contract;
mod errors;
mod ordinal;
mod scripted;

pub use contract::{ConstructionOutcome, ConstructorOperation, ModelConstructor};
pub use errors::{ConstructorError, ConstructorResult};
pub use ordinal::{OrdinalConstructor, Ranking, DEFAULT_MODEL_SAMPLES};
pub use scripted::{ConstructorCall, ScriptedConstructor, Verdict};
