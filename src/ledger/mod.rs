//! Statement ledger
//!
//! The ledger is the chronological record of every preference statement the
//! decision maker has supplied and that is still accepted.
//!
//! # Invariants
//!
//! - Records are immutable once issued
//! - Order is oldest to newest by iteration, ties broken by insertion order
//! - The only mutators are `append` and the wholesale `replace_with`

mod errors;
mod history;
mod record;

pub use errors::{LedgerError, LedgerResult};
pub use history::History;
pub use record::{RecordId, Statement, StatementRecord};
