//! Ordinal ranking constructor
//!
//! Statements are strict pairwise preferences. A compatible model is a total
//! ranking of every mentioned alternative that extends all preferences, so a
//! sequence is inconsistent exactly when its preference graph has a cycle
//! (a reflexive statement is a cycle of length one).
//!
//! Consistent builds sample random linear extensions of the preference graph
//! with a seeded RNG; the same seed and sequence give the same models.
//!
//! The constructor keeps an edge multiset driven by the notification hooks.
//! A build reuses it when it reflects exactly the requested sequence and
//! falls back to a full rebuild otherwise.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::ledger::{RecordId, StatementRecord};
use crate::observability::Timer;

use super::contract::{ConstructionOutcome, ModelConstructor};
use super::errors::ConstructorResult;

/// Default number of rankings sampled per build
pub const DEFAULT_MODEL_SAMPLES: usize = 16;

/// A total ranking of alternatives, best first
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ranking(pub Vec<String>);

impl Ranking {
    /// Rank position of `alternative` (0 = best)
    pub fn position(&self, alternative: &str) -> Option<usize> {
        self.0.iter().position(|a| a == alternative)
    }
}

/// Cached preference graph and the record ids it reflects
#[derive(Debug, Default)]
struct EdgeCache {
    records: BTreeSet<RecordId>,
    edges: BTreeMap<(String, String), usize>,
}

impl EdgeCache {
    fn insert(&mut self, record: &StatementRecord) {
        if self.records.insert(record.id()) {
            let s = record.statement();
            *self
                .edges
                .entry((s.preferred.clone(), s.over.clone()))
                .or_insert(0) += 1;
        }
    }

    fn remove(&mut self, record: &StatementRecord) {
        if !self.records.remove(&record.id()) {
            return;
        }
        let s = record.statement();
        let key = (s.preferred.clone(), s.over.clone());
        if let Some(count) = self.edges.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.edges.remove(&key);
            }
        }
    }

    fn reflects(&self, statements: &[StatementRecord]) -> bool {
        self.records.len() == statements.len()
            && statements.iter().all(|r| self.records.contains(&r.id()))
    }

    fn rebuild(&mut self, statements: &[StatementRecord]) {
        *self = EdgeCache::default();
        for record in statements {
            self.insert(record);
        }
    }
}

/// Constructor of ordinal rankings compatible with pairwise preferences.
#[derive(Debug)]
pub struct OrdinalConstructor {
    samples: usize,
    rng: StdRng,
    cache: EdgeCache,
    full_rebuilds: u64,
    incremental_builds: u64,
}

impl OrdinalConstructor {
    /// Create a constructor sampling up to `samples` rankings per build.
    ///
    /// Without a seed the RNG is seeded from OS entropy.
    pub fn new(samples: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            samples: samples.max(1),
            rng,
            cache: EdgeCache::default(),
            full_rebuilds: 0,
            incremental_builds: 0,
        }
    }

    /// Number of builds that had to recompute the preference graph
    pub fn full_rebuilds(&self) -> u64 {
        self.full_rebuilds
    }

    /// Number of builds served from the incrementally maintained graph
    pub fn incremental_builds(&self) -> u64 {
        self.incremental_builds
    }

    /// Draw one random linear extension, or `None` if the graph has a cycle.
    fn sample_extension(&mut self) -> Option<Ranking> {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut successors: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (preferred, over) in self.cache.edges.keys() {
            in_degree.entry(preferred.as_str()).or_insert(0);
            *in_degree.entry(over.as_str()).or_insert(0) += 1;
            successors
                .entry(preferred.as_str())
                .or_default()
                .push(over.as_str());
        }

        let total = in_degree.len();
        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(alt, _)| *alt)
            .collect();
        let mut order = Vec::with_capacity(total);

        while !ready.is_empty() {
            let pick = self.rng.gen_range(0..ready.len());
            let alt = ready.swap_remove(pick);
            order.push(alt.to_string());

            for &next in successors.get(alt).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(next);
                    }
                }
            }
            // Keep candidate order independent of insertion history.
            ready.sort_unstable();
        }

        (order.len() == total).then_some(Ranking(order))
    }
}

impl Default for OrdinalConstructor {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_SAMPLES, None)
    }
}

impl ModelConstructor for OrdinalConstructor {
    type Model = Ranking;

    fn clear_models(&mut self) -> ConstructorResult<()> {
        self.cache = EdgeCache::default();
        Ok(())
    }

    fn notify_added_statements(&mut self, records: &[StatementRecord]) -> ConstructorResult<()> {
        for record in records {
            self.cache.insert(record);
        }
        Ok(())
    }

    fn notify_removed_statements(
        &mut self,
        records: &[StatementRecord],
    ) -> ConstructorResult<()> {
        for record in records {
            self.cache.remove(record);
        }
        Ok(())
    }

    fn build(
        &mut self,
        statements: &[StatementRecord],
    ) -> ConstructorResult<ConstructionOutcome<Ranking>> {
        let timer = Timer::new();

        if self.cache.reflects(statements) {
            self.incremental_builds += 1;
        } else {
            self.cache.rebuild(statements);
            self.full_rebuilds += 1;
        }

        let mut rankings = BTreeSet::new();
        let mut drawn = 0u64;
        for _ in 0..self.samples {
            drawn += 1;
            match self.sample_extension() {
                Some(ranking) => {
                    rankings.insert(ranking);
                }
                None => {
                    return Ok(ConstructionOutcome::inconsistent(statements.len())
                        .with_samples_drawn(drawn)
                        .with_elapsed_ms(timer.elapsed_ms_f64()));
                }
            }
        }

        Ok(
            ConstructionOutcome::consistent(rankings.into_iter().collect(), statements.len())
                .with_samples_drawn(drawn)
                .with_elapsed_ms(timer.elapsed_ms_f64()),
        )
    }
}
