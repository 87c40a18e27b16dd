//! Store Statistics Module
//!
//! Tracks cache-aside hits and misses, evictions, remote fetches and space usage.

use serde::Serialize;

// == Store Stats ==
/// Tracks store performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Lookups answered from a cached record
    pub hits: u64,
    /// Lookups that had to go to the remote source
    pub misses: u64,
    /// Records removed to reclaim space
    pub evictions: u64,
    /// Successful remote fetches
    pub remote_fetches: u64,
    /// Fetched payloads that could not be persisted
    pub persist_failures: u64,
    /// Current number of entries in the byte store
    pub total_entries: usize,
    /// Bytes currently accounted as used
    pub space_used: usize,
    /// Byte ceiling
    pub budget: usize,
}

impl StoreStats {
    // == Constructor ==
    /// Creates a new StoreStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache-aside hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Percentage of the budget in use, 0.0 when there is no budget.
    pub fn usage_percent(&self) -> f64 {
        if self.budget == 0 {
            0.0
        } else {
            self.space_used as f64 * 100.0 / self.budget as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_remote_fetch(&mut self) {
        self.remote_fetches += 1;
    }

    pub fn record_persist_failure(&mut self) {
        self.persist_failures += 1;
    }
}
