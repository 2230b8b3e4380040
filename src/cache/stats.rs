//! Cache Statistics Module
//!
//! Hit/miss counters and the serializable state snapshot.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// == Cache Stats ==
/// Hit and miss counters of one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Cache State ==
/// Immutable view of a cache taken under its lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheState {
    pub miss_count: u64,
    pub hit_count: u64,
    pub ttl: Duration,
    pub capacity: usize,
    pub num_entries: usize,
}

impl CacheState {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if nothing has been counted.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    /// Renders the snapshot as indented JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
