//! Cache Statistics Module
//!
//! Tracks engine activity: hits, misses, writes and decode failures.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache engine metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of reads that found a value
    pub hits: u64,
    /// Number of reads on absent keys
    pub misses: u64,
    /// Number of successful writes (scalar, set or list)
    pub writes: u64,
    /// Number of reads rejected by the serializer
    pub format_errors: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_format_error(&mut self) {
        self.format_errors += 1;
    }
}
