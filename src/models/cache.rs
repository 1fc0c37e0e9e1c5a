//! Instantiated model cache.
//!
//! Keyed by style and compute preference, holding at most one model per
//! key. With the default capacity of one the cached model is replaced
//! only when the key changes.

use crate::control::{ComputeUnits, StyleId};

/// Cache key: one instantiated model per style and preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey {
    /// Style of the model.
    pub style: StyleId,
    /// Compute preference it was built with.
    pub units: ComputeUnits,
}

impl ModelKey {
    /// Builds a key.
    pub fn new(style: StyleId, units: ComputeUnits) -> Self {
        Self { style, units }
    }
}

/// Counters for cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served by a cached model.
    pub hits: u64,
    /// Requests that had to instantiate.
    pub misses: u64,
    /// Models dropped to make room.
    pub evictions: u64,
}

/// Least-recently-used cache of instantiated models.
pub struct ModelCache<M> {
    // most recently used last
    entries: Vec<(ModelKey, M)>,
    capacity: usize,
    stats: CacheStats,
}

impl<M> ModelCache<M> {
    /// Creates a cache holding up to `capacity` models (minimum one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// Returns the model for `key`, instantiating it with `load` on a miss.
    ///
    /// A failed load leaves the cache untouched, so the next request for
    /// the same key tries again.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: ModelKey,
        load: impl FnOnce() -> Result<M, E>,
    ) -> Result<&mut M, E> {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.stats.hits += 1;
            let entry = self.entries.remove(pos);
            self.entries.push(entry);
        } else {
            self.stats.misses += 1;
            let model = load()?;
            if self.entries.len() == self.capacity {
                let (evicted, _) = self.entries.remove(0);
                self.stats.evictions += 1;
                tracing::debug!(style = %evicted.style, units = ?evicted.units, "Evicted cached model");
            }
            self.entries.push((key, model));
        }
        let last = self.entries.len() - 1;
        Ok(&mut self.entries[last].1)
    }

    /// True if a model for `key` is cached.
    pub fn contains(&self, key: &ModelKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of cached models.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no model is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached models.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Counters since creation.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drops every cached model.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<M> Default for ModelCache<M> {
    fn default() -> Self {
        Self::new(1)
    }
}
