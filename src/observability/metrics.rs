//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only when the registry is created

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for a decision session
///
/// Relaxed atomics: counters are diagnostics, not synchronization.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    iterations: AtomicU64,
    statements_elicited: AtomicU64,
    reintroductions: AtomicU64,
    reintroduction_failures: AtomicU64,
    constructor_probes: AtomicU64,
    records_discarded: AtomicU64,
    records_recovered: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one elicitation iteration
    pub fn increment_iterations(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    /// Count elicited statements
    pub fn add_statements_elicited(&self, count: u64) {
        self.statements_elicited.fetch_add(count, Ordering::Relaxed);
    }

    /// Count one completed reintroduction and its outcome
    pub fn record_reintroduction(&self, probes: u64, discarded: u64, recovered: u64) {
        self.reintroductions.fetch_add(1, Ordering::Relaxed);
        self.constructor_probes.fetch_add(probes, Ordering::Relaxed);
        self.records_discarded.fetch_add(discarded, Ordering::Relaxed);
        self.records_recovered.fetch_add(recovered, Ordering::Relaxed);
    }

    /// Count one aborted reintroduction
    pub fn increment_reintroduction_failures(&self) {
        self.reintroduction_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            iterations: self.iterations.load(Ordering::Relaxed),
            statements_elicited: self.statements_elicited.load(Ordering::Relaxed),
            reintroductions: self.reintroductions.load(Ordering::Relaxed),
            reintroduction_failures: self.reintroduction_failures.load(Ordering::Relaxed),
            constructor_probes: self.constructor_probes.load(Ordering::Relaxed),
            records_discarded: self.records_discarded.load(Ordering::Relaxed),
            records_recovered: self.records_recovered.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub iterations: u64,
    pub statements_elicited: u64,
    pub reintroductions: u64,
    pub reintroduction_failures: u64,
    pub constructor_probes: u64,
    pub records_discarded: u64,
    pub records_recovered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_reintroduction_accumulates() {
        let metrics = MetricsRegistry::new();
        metrics.record_reintroduction(4, 1, 1);
        metrics.record_reintroduction(1, 1, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.reintroductions, 2);
        assert_eq!(snapshot.constructor_probes, 5);
        assert_eq!(snapshot.records_discarded, 2);
        assert_eq!(snapshot.records_recovered, 1);
    }

    #[test]
    fn test_iteration_counters() {
        let metrics = MetricsRegistry::new();
        metrics.increment_iterations();
        metrics.add_statements_elicited(3);
        metrics.increment_reintroduction_failures();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.iterations, 1);
        assert_eq!(snapshot.statements_elicited, 3);
        assert_eq!(snapshot.reintroduction_failures, 1);
    }
}
