//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! durable-tier activity.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups served from the in-process tier
    pub hits: u64,
    /// Lookups served from the durable tier (and repopulated in-process)
    pub durable_hits: u64,
    /// Lookups that found nothing fresh in either tier
    pub misses: u64,
    /// Entries evicted because the in-process tier was over capacity
    pub evictions: u64,
    /// Durable-tier failures absorbed by the cache
    pub durable_errors: u64,
    /// Current number of entries in the in-process tier
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the overall hit rate across both tiers.
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits + self.durable_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_durable_hit(&mut self) {
        self.durable_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_durable_error(&mut self) {
        self.durable_errors += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
