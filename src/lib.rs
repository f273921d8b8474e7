//! prefledger - preference elicitation with consistency reintroduction
//!
//! Pairwise preference statements accumulate in a chronological ledger.
//! When a model constructor finds the ledger infeasible, an inconsistency
//! handler drops the oldest statements until the rest is consistent and
//! then re-admits as many of the dropped ones as it can.

pub mod cli;
pub mod constructor;
pub mod context;
pub mod ledger;
pub mod observability;
pub mod recovery;
pub mod session;
