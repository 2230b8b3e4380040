//! Cache Entry Module
//!
//! Defines the record stored in each arena slot, with its TTL bookkeeping
//! and occupancy flag.

use std::time::{Duration, Instant};

// == Slot State ==
/// Occupancy of an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Holds a key/value pair that is currently indexed
    Occupied,
    /// Recycled slot with no index entry
    Free,
}

// == Cache Entry ==
/// Represents a single cache record with value and TTL metadata.
///
/// Records live in the arena of [`LruList`](super::list::LruList) and are linked by
/// slot index; `prev`/`next` are only meaningful while the record is linked.
#[derive(Debug, Clone)]
pub struct CacheEntry<P> {
    /// Index key derived by the key adapter
    pub key: String,
    /// Stored payload (plain value or encoded bytes)
    pub value: P,
    /// Last write time
    pub inserted_at: Instant,
    /// Instant at which the entry stops being live
    pub expires_at: Instant,
    pub state: SlotState,
    pub(crate) prev: usize,
    pub(crate) next: usize,
}

impl<P> CacheEntry<P> {
    // == Constructor ==
    /// Creates an occupied, unlinked record written at `now`.
    pub fn new(key: String, value: P, now: Instant, ttl: Duration) -> Self {
        Self {
            key,
            value,
            inserted_at: now,
            expires_at: now + ttl,
            state: SlotState::Occupied,
            prev: 0,
            next: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: the entry is expired once `now >= expires_at`,
    /// so a record written with TTL `t` is stale exactly `t` after the write.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn is_occupied(&self) -> bool {
        self.state == SlotState::Occupied
    }

    // == Refresh ==
    /// Stores a new payload and restarts the TTL window.
    pub fn rewrite(&mut self, value: P, now: Instant, ttl: Duration) {
        self.value = value;
        self.inserted_at = now;
        self.expires_at = now + ttl;
    }

    /// Extends the TTL window without touching the payload (sliding expiration).
    pub fn touch(&mut self, now: Instant, ttl: Duration) {
        self.expires_at = now + ttl;
    }

    // == Time To Live ==
    /// Returns the remaining TTL, zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}
