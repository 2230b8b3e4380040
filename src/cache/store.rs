//! Cache Store Module
//!
//! Main cache engine combining a key index with the arena-backed LRU list and
//! TTL-aware admission.
//!
//! Unlike a plain LRU cache, a full cache never discards a live value: a new
//! key is admitted only if the least recently used entry has already expired,
//! otherwise the write fails with [`CacheError::CacheFull`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::cache::codec::{Payload, ValueCodec};
use crate::cache::entry::{CacheEntry, SlotState};
use crate::cache::list::{self, LruList};
use crate::cache::stats::{CacheState, CacheStats};
use crate::config::{CacheConfig, ConfigError};
use crate::error::{BoxError, CacheError, ReadError, Result};

type KeyAdapter<K> = Box<dyn Fn(&K) -> std::result::Result<String, BoxError> + Send + Sync>;

// == Inner State ==
/// Everything guarded by the cache lock.
#[derive(Debug)]
struct Inner<V> {
    /// Index key -> arena slot
    index: HashMap<String, usize>,
    /// Arena and recency order of the live records
    list: LruList<Payload<V>>,
    stats: CacheStats,
}

impl<V> Inner<V> {
    // == Allocate Slot ==
    /// Admits `key` as a new record at the MRU end.
    ///
    /// Below capacity a fresh slot is used. At capacity the LRU record is
    /// evicted only if it has expired; a live LRU record makes the whole
    /// admission fail and leaves the cache untouched.
    fn allocate_slot(
        &mut self,
        key: String,
        payload: Payload<V>,
        now: Instant,
        capacity: usize,
        ttl: Duration,
    ) -> Result<usize> {
        if self.list.len() >= capacity {
            let lru = self.list.least_recent().ok_or(CacheError::CacheFull)?;
            if !self.list.get(lru).is_expired(now) {
                return Err(CacheError::CacheFull);
            }

            self.list.unlink(lru);
            let evicted = std::mem::take(&mut self.list.get_mut(lru).key);
            self.index.remove(&evicted);
            self.list.release(lru);
            debug!(key = %evicted, "evicted expired LRU entry");
        }

        let id = self.list.allocate(CacheEntry::new(key.clone(), payload, now, ttl));
        self.list.link_as_most_recent(id);
        self.index.insert(key, id);
        Ok(id)
    }
}

// == Simple Cache ==
/// Fixed-capacity TTL cache with LRU ordering, safe to share between threads.
///
/// `K` is the application key type, turned into an index string by the key
/// adapter given at construction. Every operation except iteration takes the
/// internal lock for its whole duration; key adaptation and value encoding
/// run before the lock is taken.
pub struct SimpleCache<K: ?Sized, V> {
    inner: Mutex<Inner<V>>,
    key_adapter: KeyAdapter<K>,
    codec: Option<ValueCodec<V>>,
    config: CacheConfig,
}

impl<K: ?Sized, V: Clone> SimpleCache<K, V> {
    // == Constructor ==
    /// Creates a new cache.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of live entries
    /// * `cap_factor` - Index over-allocation factor in [0.1, 3], so the index
    ///   does not rehash as slots are recycled
    /// * `ttl` - Time to live of every entry
    /// * `key_adapter` - Turns an application key into the index string
    ///
    /// # Panics
    /// Panics if any parameter is out of range.
    pub fn new<F>(capacity: usize, cap_factor: f64, ttl: Duration, key_adapter: F) -> Self
    where
        F: Fn(&K) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        match Self::from_config(CacheConfig::new(capacity, cap_factor, ttl), key_adapter) {
            Ok(cache) => cache,
            Err(err) => panic!("{}", err),
        }
    }

    /// Creates a new cache, reporting invalid parameters instead of panicking.
    pub fn from_config<F>(config: CacheConfig, key_adapter: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&K) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        config.validate()?;
        trace!(
            capacity = config.capacity,
            reserved = config.reserved_capacity(),
            ttl = ?config.ttl,
            "creating cache"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                index: HashMap::with_capacity(config.reserved_capacity()),
                list: LruList::with_capacity(config.capacity),
                stats: CacheStats::default(),
            }),
            key_adapter: Box::new(key_adapter),
            codec: None,
            config,
        })
    }

    /// Stores values encoded through `codec` and decodes them on every read.
    pub fn with_codec(mut self, codec: ValueCodec<V>) -> Self {
        self.codec = Some(codec);
        self
    }

    fn adapt(&self, key: &K) -> Result<String> {
        (self.key_adapter)(key).map_err(CacheError::KeyAdaptation)
    }

    // == Insert Or Update ==
    /// Stores `value` under `key`, updating it if the key is already cached.
    ///
    /// A new key counts a miss; every successful write counts a hit, so a new
    /// key bumps both counters. Returns the value that was cached.
    ///
    /// # Errors
    /// - `KeyAdaptation` if the key adapter rejects `key`
    /// - `Codec` if the value cannot be encoded
    /// - `CacheFull` if the cache is at capacity and its LRU entry is live
    pub fn insert_or_update(&self, key: &K, value: V) -> Result<V> {
        let key = self.adapt(key)?;
        let payload = Payload::wrap(&value, self.codec.as_ref())?;
        let now = Instant::now();

        let mut inner = self.inner.lock();
        match inner.index.get(&key).copied() {
            Some(id) => {
                inner.list.get_mut(id).rewrite(payload, now, self.config.ttl);
                inner.list.link_as_most_recent(id);
            }
            None => {
                inner.stats.record_miss();
                inner.allocate_slot(key, payload, now, self.config.capacity, self.config.ttl)?;
            }
        }
        inner.stats.record_hit();

        Ok(value)
    }

    // == Read ==
    /// Retrieves the value cached under `key`.
    ///
    /// A successful read slides the entry's expiry to `now + ttl` and makes it
    /// the most recently used.
    ///
    /// # Errors
    /// - `KeyAdaptation` if the key adapter rejects `key`
    /// - `NotFound` if the key is not cached
    /// - `Expired` if the TTL has elapsed; the stale value is in `stale`
    pub fn read(&self, key: &K) -> std::result::Result<V, ReadError<V>> {
        let key = self.adapt(key)?;
        let now = Instant::now();

        let (payload, expired) = {
            let mut inner = self.inner.lock();
            let Inner { index, list, stats } = &mut *inner;

            let Some(&id) = index.get(&key) else {
                stats.record_miss();
                return Err(CacheError::NotFound(key).into());
            };

            let entry = list.get_mut(id);
            if entry.is_expired(now) {
                stats.record_miss();
                (entry.value.clone(), true)
            } else {
                stats.record_hit();
                entry.touch(now, self.config.ttl);
                let payload = entry.value.clone();
                list.link_as_most_recent(id);
                (payload, false)
            }
        };

        if expired {
            let error = CacheError::Expired(key);
            return Err(match payload.into_value(self.codec.as_ref()) {
                Ok(stale) => ReadError::stale(error, stale),
                Err(_) => error.into(),
            });
        }
        Ok(payload.into_value(self.codec.as_ref())?)
    }

    // == Most Recent ==
    /// Returns the key and value at the MRU end without refreshing its TTL
    /// or touching the counters.
    ///
    /// # Errors
    /// - `EmptyCache` if nothing is cached
    /// - `MruExpired` if the head entry is stale; the stale pair is in `stale`
    pub fn most_recent(&self) -> std::result::Result<(String, V), ReadError<(String, V)>> {
        let now = Instant::now();

        let (key, payload, stale) = {
            let inner = self.inner.lock();
            let id = inner.list.most_recent().ok_or(CacheError::EmptyCache)?;
            let entry = inner.list.get(id);
            let stale = entry.is_expired(now) || !entry.is_occupied();
            (entry.key.clone(), entry.value.clone(), stale)
        };

        let value = payload.into_value(self.codec.as_ref())?;
        if stale {
            return Err(ReadError::stale(
                CacheError::MruExpired(key.clone()),
                (key, value),
            ));
        }
        Ok((key, value))
    }

    // == Clean ==
    /// Drops every entry and resets the counters.
    ///
    /// Slots are marked free and recycled by later writes; index and arena
    /// storage is kept.
    pub fn clean(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.list.len();
        inner.list.clear();
        inner.index.clear();
        inner.stats.reset();
        debug!(dropped, "cache cleaned");
    }

    // == Snapshot ==
    /// Returns the counters and sizing of the cache.
    ///
    /// Takes the cache lock: calling this while holding a [`CacheGuard`] from
    /// the same thread deadlocks.
    pub fn snapshot(&self) -> CacheState {
        let inner = self.inner.lock();
        CacheState {
            miss_count: inner.stats.misses,
            hit_count: inner.stats.hits,
            ttl: self.config.ttl,
            capacity: self.config.capacity,
            num_entries: inner.list.len(),
        }
    }

    /// Snapshot rendered as indented JSON.
    pub fn state_json(&self) -> Result<String> {
        self.snapshot().to_json()
    }

    // == Lock ==
    /// Takes the cache lock and returns a guard for iterating the entries.
    ///
    /// Every other cache operation blocks until the guard is dropped, and
    /// calling one from the thread holding the guard deadlocks.
    pub fn lock(&self) -> CacheGuard<'_, V> {
        CacheGuard {
            inner: self.inner.lock(),
            codec: self.codec.as_ref(),
        }
    }
}

impl<K: ?Sized, V> SimpleCache<K, V> {
    pub fn hit_count(&self) -> u64 {
        self.inner.lock().stats.hits
    }

    pub fn miss_count(&self) -> u64 {
        self.inner.lock().stats.misses
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn reserved_capacity(&self) -> usize {
        self.config.reserved_capacity()
    }
}

#[cfg(test)]
impl<K: ?Sized, V> SimpleCache<K, V> {
    /// Checks that the index and the recency list describe the same records.
    pub(crate) fn check_invariants(&self) {
        let inner = self.inner.lock();
        inner.list.check_invariants();
        assert_eq!(inner.index.len(), inner.list.len(), "index and list sizes differ");
        assert!(inner.list.len() <= self.config.capacity, "capacity exceeded");
        for (id, entry) in inner.list.iter() {
            assert_eq!(inner.index.get(&entry.key), Some(&id), "index does not point at {}", entry.key);
        }
    }
}

impl<K: ?Sized, V> std::fmt::Debug for SimpleCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleCache")
            .field("config", &self.config)
            .field("codec", &self.codec.is_some())
            .finish_non_exhaustive()
    }
}

// == Cache Guard ==
/// Exclusive access to a cache, held for the lifetime of the guard.
pub struct CacheGuard<'a, V> {
    inner: MutexGuard<'a, Inner<V>>,
    codec: Option<&'a ValueCodec<V>>,
}

impl<'a, V> CacheGuard<'a, V> {
    /// Walks the entries from most to least recently used.
    pub fn iter(&self) -> Entries<'_, V> {
        Entries {
            inner: self.inner.list.iter(),
            codec: self.codec,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.list.is_empty()
    }
}

/// Lazy MRU→LRU iterator over the entries of a locked cache.
pub struct Entries<'g, V> {
    inner: list::Iter<'g, Payload<V>>,
    codec: Option<&'g ValueCodec<V>>,
}

impl<'g, V> Iterator for Entries<'g, V> {
    type Item = EntryView<'g, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, entry)| EntryView {
            entry,
            codec: self.codec,
        })
    }
}

// == Entry View ==
/// Read-only view of one record met during iteration.
pub struct EntryView<'g, V> {
    entry: &'g CacheEntry<Payload<V>>,
    codec: Option<&'g ValueCodec<V>>,
}

impl<'g, V> EntryView<'g, V> {
    pub fn key(&self) -> &'g str {
        &self.entry.key
    }

    pub fn inserted_at(&self) -> Instant {
        self.entry.inserted_at
    }

    pub fn expires_at(&self) -> Instant {
        self.entry.expires_at
    }

    pub fn state(&self) -> SlotState {
        self.entry.state
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.entry.is_expired(now)
    }

    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.entry.ttl_remaining(now)
    }
}

impl<'g, V: Clone> EntryView<'g, V> {
    /// Decoded copy of the stored value.
    pub fn value(&self) -> Result<V> {
        self.entry.value.unwrap_with(self.codec)
    }
}
