//! Concurrent key/value cache with LRU eviction and TTL expiry
//!
//! `CacheStore` is the shared market-data cache: bounded memory via LRU
//! eviction, per-entry TTL enforced lazily at access time (plus an explicit
//! `purge_expired` sweep), and eventually-consistent statistics counters.
//! Capacity pressure is never an error; the store evicts instead of
//! rejecting.
//!
//! The store is cheap to clone: clones share one internal allocation, so
//! many collaborators can hold handles without a single owner.

mod lru;

pub use lru::CacheEntry;

use lru::LruCore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction kicks in
    pub max_size: usize,
    /// Default TTL applied by `put`; `None` means entries never expire
    pub default_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            default_ttl: None,
        }
    }
}

/// Point-in-time snapshot of cache counters
///
/// Counters are monotonically increasing and read with relaxed ordering, so
/// a snapshot taken under concurrent mutation is eventually consistent, not
/// strictly consistent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStatistics {
    /// Successful `get` calls
    pub hits: u64,
    /// `get` calls for missing or expired keys
    pub misses: u64,
    /// `put` calls (inserts and overwrites)
    pub puts: u64,
    /// Successful `delete` calls
    pub deletes: u64,
    /// Entries removed by LRU capacity eviction
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
}

impl CacheStatistics {
    /// Hit ratio as a percentage of all lookups
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                (self.hits as f64 / total as f64) * 100.0
            }
        }
    }
}

#[derive(Debug, Default)]
struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl StatCounters {
    fn snapshot(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.puts.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct CacheInner<K, V> {
    config: CacheConfig,
    core: Mutex<LruCore<K, V>>,
    stats: StatCounters,
}

/// Concurrent LRU + TTL key/value store
///
/// Per-key operations are linearizable under the internal mutex; every
/// critical section is O(1) apart from the explicit `purge_expired` sweep.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

impl<K, V> Clone for CacheStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> CacheStore<K, V> {
    /// Create a store with the given configuration
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                config,
                core: Mutex::new(LruCore::new()),
                stats: StatCounters::default(),
            }),
        }
    }

    /// Insert or overwrite with the configured default TTL
    ///
    /// Never fails: capacity is enforced by evicting the least recently
    /// used entries, not by rejecting the put.
    pub fn put(&self, key: K, value: V) {
        self.put_with_ttl(key, value, self.inner.config.default_ttl);
    }

    /// Insert or overwrite with an explicit TTL (`None` = never expires)
    ///
    /// Overwriting resets the entry's expiry to the new deadline; expiry is
    /// never shortened implicitly by any other operation.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) {
        let mut core = self.inner.core.lock();
        core.insert(key, CacheEntry::new(value, ttl));
        let mut evicted = 0u64;
        while core.len() > self.inner.config.max_size {
            if core.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        drop(core);
        self.inner.stats.puts.fetch_add(1, Ordering::Relaxed);
        if evicted > 0 {
            self.inner
                .stats
                .evictions
                .fetch_add(evicted, Ordering::Relaxed);
        }
    }

    /// Look up a key, updating recency
    ///
    /// Missing and expired keys both return `None` (a miss, not an error);
    /// an expired entry is removed on the spot and never returned.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut core = self.inner.core.lock();
        let Some(idx) = core.slot_of(key) else {
            drop(core);
            self.inner.stats.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        if core.entry(idx).is_expired(now) {
            core.remove(idx);
            drop(core);
            self.inner.stats.misses.fetch_add(1, Ordering::Relaxed);
            self.inner.stats.expirations.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        core.promote(idx);
        let entry = core.entry_mut(idx);
        entry.touch(now);
        let value = entry.value.clone();
        drop(core);
        self.inner.stats.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    /// Existence check without touching recency or hit/miss counters
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        let core = self.inner.core.lock();
        core.slot_of(key)
            .is_some_and(|idx| !core.entry(idx).is_expired(now))
    }

    /// Remove a key, returning whether it existed
    pub fn delete(&self, key: &K) -> bool {
        let mut core = self.inner.core.lock();
        let Some(idx) = core.slot_of(key) else {
            return false;
        };
        core.remove(idx);
        drop(core);
        self.inner.stats.deletes.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Number of entries currently held (expired-but-unswept included)
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.core.lock().len()
    }

    /// True when the store holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Drop every entry; statistics counters are left untouched
    pub fn clear(&self) {
        self.inner.core.lock().clear();
    }

    /// Sweep out every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let purged = self.inner.core.lock().purge_expired(now);
        if purged > 0 {
            self.inner
                .stats
                .expirations
                .fetch_add(purged as u64, Ordering::Relaxed);
            debug!(purged, "purged expired cache entries");
        }
        purged
    }

    /// Snapshot of the statistics counters
    #[must_use]
    pub fn statistics(&self) -> CacheStatistics {
        self.inner.stats.snapshot()
    }

    /// Reset all statistics counters to zero
    pub fn reset_statistics(&self) {
        self.inner.stats.reset();
    }

    /// Configured capacity and TTL
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }
}
