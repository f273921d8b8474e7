//! Consistency reintroduction
//!
//! Given a statement sequence for which the model constructor found no
//! compatible model, find a consistent subsequence by removing the oldest
//! statements first, then try to re-admit what was removed.
//!
//! # Sequence (strict order)
//!
//! 1. Register a decision context with the handler
//! 2. Shrink: drop the oldest record and rebuild until consistent
//! 3. Recover: re-admit removed records newest-removed first, one probe each
//! 4. Return the report; no partial report on any error
//! 5. Unregister the decision context
//!
//! # Invariants
//!
//! - Shrink always removes the single oldest remaining record
//! - Recovery probes removed records in reverse removal order
//! - Every probed sequence keeps chronological order
//! - `attempts` equals the number of constructor builds
//! - The empty sequence is consistent for every constructor; if shrinking
//!   reaches it inconsistent, the call fails fatally

mod errors;
mod handler;
mod report;

pub use errors::{Phase, ReintroductionError, ReintroductionResult};
pub use handler::{ConfiguredHandler, InconsistencyHandler, RemoveOldest, RemoveOldestThenRecover};
pub use report::{RecoveryReport, RecoveryState};
