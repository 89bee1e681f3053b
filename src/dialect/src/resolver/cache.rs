//! Resolution cache
//!
//! Memoizes effective mappings per dialect for the lifetime of one catalog
//! snapshot. Backed by `DashMap` so concurrent readers never block each other;
//! writes go through insert-if-absent so racing resolvers of the same dialect
//! converge on the first stored value.

use crate::types::EffectiveMapping;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Statistics about cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Number of puts that found the key already populated
    pub lost_races: usize,
    /// Total number of entries in cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe map of dialect id -> effective mapping
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, Arc<EffectiveMapping>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    lost_races: AtomicUsize,
}

impl ResolutionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached mapping for a dialect, if resolved already
    pub fn get(&self, dialect: &str) -> Option<Arc<EffectiveMapping>> {
        match self.entries.get(dialect) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a completed mapping unless another resolver got there first
    ///
    /// Returns whichever mapping ends up in the cache.
    pub fn put(&self, dialect: &str, mapping: EffectiveMapping) -> Arc<EffectiveMapping> {
        let mut inserted = false;
        let stored = self
            .entries
            .entry(dialect.to_string())
            .or_insert_with(|| {
                inserted = true;
                Arc::new(mapping)
            })
            .value()
            .clone();

        if !inserted {
            self.lost_races.fetch_add(1, Ordering::Relaxed);
            debug!(dialect, "Effective mapping already cached by a concurrent resolver");
        }

        stored
    }

    /// Drop every cached mapping
    pub fn invalidate_all(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!(dropped, "Resolution cache invalidated");
    }

    /// Whether a dialect has been resolved
    pub fn contains(&self, dialect: &str) -> bool {
        self.entries.contains_key(dialect)
    }

    /// Number of cached dialects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            lost_races: self.lost_races.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
