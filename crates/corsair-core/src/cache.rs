//! Memoization of policy selections.
//!
//! Selections are keyed by `(origin, method)`. Policies never change at
//! runtime, so entries never go stale and eviction never changes a result.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::selector::Selection;

/// Cache key: the request origin and, under `verbmatch`, the method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    /// Request `Origin` value.
    pub origin: String,
    /// Requested method, or `None` when the strategy ignores it.
    pub method: Option<String>,
}

impl SelectionKey {
    /// Creates a key.
    pub fn new(origin: impl Into<String>, method: Option<&str>) -> Self {
        Self {
            origin: origin.into(),
            method: method.map(str::to_string),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub size: usize,
    /// Number of evictions due to capacity.
    pub evictions: u64,
}

/// A concurrency-safe store of selections.
pub trait SelectionCache: Send + Sync + std::fmt::Debug {
    /// Returns the cached selection for `key`, if any.
    fn get(&self, key: &SelectionKey) -> Option<Selection>;

    /// Stores a selection.
    fn insert(&self, key: SelectionKey, selection: Selection);

    /// Drops every entry.
    fn clear(&self);

    /// Current statistics.
    fn stats(&self) -> CacheStats;
}

/// A cache that stores nothing.
#[derive(Debug, Default)]
pub struct NoCache {
    misses: AtomicU64,
}

impl SelectionCache for NoCache {
    fn get(&self, _key: &SelectionKey) -> Option<Selection> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn insert(&self, _key: SelectionKey, _selection: Selection) {}

    fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        CacheStats {
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}

/// A bounded concurrent cache.
///
/// When the capacity is reached an arbitrary entry is evicted to make room.
#[derive(Debug)]
pub struct BoundedCache {
    capacity: usize,
    entries: DashMap<SelectionKey, Selection>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl BoundedCache {
    /// Default number of entries.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates a cache holding at most `capacity` entries. A capacity of
    /// zero disables storage.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_one(&self) {
        // The iterator guard must be released before removing.
        let victim = self.entries.iter().next().map(|entry| entry.key().clone());
        if let Some(key) = victim {
            if self.entries.remove(&key).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl Default for BoundedCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl SelectionCache for BoundedCache {
    fn get(&self, key: &SelectionKey) -> Option<Selection> {
        if let Some(entry) = self.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.value().clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn insert(&self, key: SelectionKey, selection: Selection) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_one();
        }
        self.entries.insert(key, selection);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
