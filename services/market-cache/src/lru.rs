//! Index-based LRU bookkeeping
//!
//! Slot arena with intrusive prev/next indices plus a hash index, so the
//! recency list needs no heap pointer cycles. The list head is the most
//! recently used entry, the tail the least recently used. All list
//! operations are O(1); `purge_expired` is the only O(n) walk.

use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Sentinel index for "no slot"
const NIL: usize = usize::MAX;

/// Cache entry with expiry and access bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Stored value
    pub value: V,
    /// Insertion time
    pub inserted_at: Instant,
    /// Expiry deadline; `None` means the entry never expires
    pub expires_at: Option<Instant>,
    /// Last access time
    pub last_access: Instant,
}

impl<V> CacheEntry<V> {
    /// Create an entry; overwrites create a fresh entry, so expiry only
    /// ever moves forward relative to the previous deadline's insertion.
    pub(crate) fn new(value: V, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            expires_at: ttl.map(|ttl| now + ttl),
            last_access: now,
        }
    }

    /// True if the entry's deadline has passed
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    /// Record an access
    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_access = now;
    }
}

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    entry: CacheEntry<V>,
    prev: usize,
    next: usize,
}

/// LRU core: slot arena + intrusive recency list + key index
#[derive(Debug)]
pub(crate) struct LruCore<K, V> {
    slots: Vec<Option<Slot<K, V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    index: FxHashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> LruCore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            index: FxHashMap::default(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub(crate) fn slot_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Immutable view of the entry in a slot
    #[inline]
    pub(crate) fn entry(&self, idx: usize) -> &CacheEntry<V> {
        &self.slots[idx]
            .as_ref()
            .unwrap_or_else(|| unreachable!("indexed slot is occupied"))
            .entry
    }

    /// Mutable view of the entry in a slot
    #[inline]
    pub(crate) fn entry_mut(&mut self, idx: usize) -> &mut CacheEntry<V> {
        &mut self.slots[idx]
            .as_mut()
            .unwrap_or_else(|| unreachable!("indexed slot is occupied"))
            .entry
    }

    /// Insert or overwrite; either way the key becomes most recently used.
    /// Returns true when the key was not present before.
    pub(crate) fn insert(&mut self, key: K, entry: CacheEntry<V>) -> bool {
        if let Some(idx) = self.slot_of(&key) {
            *self.entry_mut(idx) = entry;
            self.promote(idx);
            return false;
        }
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(Slot {
                    key: key.clone(),
                    entry,
                    prev: NIL,
                    next: NIL,
                });
                idx
            }
            None => {
                self.slots.push(Some(Slot {
                    key: key.clone(),
                    entry,
                    prev: NIL,
                    next: NIL,
                }));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_front(idx);
        true
    }

    /// Move a slot to the head of the recency list
    pub(crate) fn promote(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    /// Remove a slot, returning its key and entry
    pub(crate) fn remove(&mut self, idx: usize) -> (K, CacheEntry<V>) {
        self.unlink(idx);
        let slot = self.slots[idx]
            .take()
            .unwrap_or_else(|| unreachable!("indexed slot is occupied"));
        self.index.remove(&slot.key);
        self.free.push(idx);
        (slot.key, slot.entry)
    }

    /// Remove and return the least recently used entry
    pub(crate) fn pop_lru(&mut self) -> Option<(K, CacheEntry<V>)> {
        if self.tail == NIL {
            return None;
        }
        Some(self.remove(self.tail))
    }

    /// Drop every expired entry, returning how many were removed
    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<usize> = self
            .index
            .values()
            .copied()
            .filter(|&idx| self.entry(idx).is_expired(now))
            .collect();
        let count = expired.len();
        for idx in expired {
            self.remove(idx);
        }
        count
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let slot = self.slots[idx]
                .as_mut()
                .unwrap_or_else(|| unreachable!("indexed slot is occupied"));
            slot.prev = NIL;
            slot.next = old_head;
        }
        if old_head != NIL {
            if let Some(head_slot) = self.slots[old_head].as_mut() {
                head_slot.prev = idx;
            }
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = self.slots[idx]
                .as_ref()
                .unwrap_or_else(|| unreachable!("indexed slot is occupied"));
            (slot.prev, slot.next)
        };
        if prev != NIL {
            if let Some(slot) = self.slots[prev].as_mut() {
                slot.next = next;
            }
        } else {
            self.head = next;
        }
        if next != NIL {
            if let Some(slot) = self.slots[next].as_mut() {
                slot.prev = prev;
            }
        } else {
            self.tail = prev;
        }
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = NIL;
            slot.next = NIL;
        }
    }
}
