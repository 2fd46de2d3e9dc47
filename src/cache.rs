use std::collections::hash_map::Entry as Slot;
use std::collections::HashMap;

use crate::aggregate::{aggregate_by, AggregationKey, KeyShape, Totals};
use crate::loader::Dataset;
use crate::schema::Measure;

/// Aggregates computed from one loaded dataset, keyed by key shape and measure.
///
/// Selection changes re-filter cached totals; only a fresh load clears them.
#[derive(Debug, Default)]
pub struct AggregateCache {
    generation: u64,
    entries: HashMap<(KeyShape, Measure), Totals<AggregationKey>>,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load generation the cached entries belong to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and adopt the generation of a newly loaded dataset
    pub fn invalidate(&mut self, generation: u64) {
        if !self.entries.is_empty() {
            tracing::debug!(
                dropped = self.entries.len(),
                from = self.generation,
                to = generation,
                "aggregate cache invalidated"
            );
        }
        self.entries.clear();
        self.generation = generation;
    }

    /// Cached totals for `shape`/`measure`, computing them from `dataset` on a miss
    pub fn get_or_compute(
        &mut self,
        dataset: &Dataset,
        shape: &KeyShape,
        measure: Measure,
    ) -> &Totals<AggregationKey> {
        match self.entries.entry((shape.clone(), measure)) {
            Slot::Occupied(e) => {
                tracing::debug!(source = dataset.locator(), ?measure, "aggregate cache hit");
                e.into_mut()
            }
            Slot::Vacant(v) => v.insert(aggregate_by(dataset.rows(), shape, measure)),
        }
    }
}
