//! Segmentation cache for repeated compounds.
//!
//! Segmenting running text sees the same words over and over; a frozen
//! model always returns the same analysis, so results are memoized with
//! least-recently-used eviction.

use ahash::AHashMap;
use cogmorph_core::{Construction, Result};
use std::collections::BTreeMap;

/// A cached segmentation and the tick of its last use.
struct Entry<C> {
    parts: Vec<C>,
    tick: u64,
}

/// LRU cache from compound to its segmentation.
///
/// Every lookup stamps the entry with a fresh tick; the oldest tick is
/// evicted first, so both hits and evictions are logarithmic.
pub struct SegmentationCache<C: Construction> {
    /// Compound -> pieces and last use
    cache: AHashMap<C, Entry<C>>,
    /// Last-use tick -> compound
    recency: BTreeMap<u64, C>,
    /// Next tick to hand out
    clock: u64,
    /// Maximum number of entries
    capacity: usize,
    /// Lookups answered from the cache
    hits: u64,
    /// Lookups that had to segment
    misses: u64,
}

impl<C: Construction> SegmentationCache<C> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: AHashMap::with_capacity(capacity),
            recency: BTreeMap::new(),
            clock: 0,
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Cache with the default capacity (10 000 compounds).
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Cached segmentation of `compound`, computing it on a miss.
    pub fn get_or_segment<F>(&mut self, compound: &C, segment: F) -> Result<Vec<C>>
    where
        F: FnOnce(&C) -> Result<Vec<C>>,
    {
        let tick = self.clock;
        if let Some(entry) = self.cache.get_mut(compound) {
            self.hits += 1;
            self.clock += 1;
            if let Some(key) = self.recency.remove(&entry.tick) {
                self.recency.insert(tick, key);
            }
            entry.tick = tick;
            return Ok(entry.parts.clone());
        }
        self.misses += 1;
        let parts = segment(compound)?;
        self.insert(compound.clone(), parts.clone());
        Ok(parts)
    }

    fn insert(&mut self, compound: C, parts: Vec<C>) {
        if self.capacity == 0 {
            return;
        }
        while self.cache.len() >= self.capacity {
            match self.recency.pop_first() {
                Some((_, oldest)) => {
                    self.cache.remove(&oldest);
                }
                None => break,
            }
        }
        let tick = self.clock;
        self.clock += 1;
        self.recency.insert(tick, compound.clone());
        self.cache.insert(compound, Entry { parts, tick });
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            entries: self.cache.len(),
            capacity: self.capacity,
            hit_rate: (lookups > 0).then(|| self.hits as f64 / lookups as f64),
        }
    }
}

impl<C: Construction> Default for SegmentationCache<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Current number of entries
    pub entries: usize,
    /// Maximum capacity
    pub capacity: usize,
    /// Fraction of lookups served from the cache, if any were made
    pub hit_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmorph_core::Baseline;

    fn b(s: &str) -> Baseline {
        Baseline::new(s)
    }

    #[test]
    fn test_cache_hit_miss() {
        let mut cache = SegmentationCache::with_capacity(3);
        let parts = cache
            .get_or_segment(&b("walking"), |_| Ok(vec![b("walk"), b("ing")]))
            .unwrap();
        assert_eq!(parts.len(), 2);

        let again = cache
            .get_or_segment(&b("walking"), |_| panic!("should be cached"))
            .unwrap();
        assert_eq!(again, parts);
        assert_eq!(cache.stats().hit_rate, Some(0.5));
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = SegmentationCache::with_capacity(2);
        for w in ["a", "b"] {
            cache.get_or_segment(&b(w), |c| Ok(vec![c.clone()])).unwrap();
        }
        // Refresh "a" so that "b" is the oldest.
        cache.get_or_segment(&b("a"), |c| Ok(vec![c.clone()])).unwrap();
        cache.get_or_segment(&b("c"), |c| Ok(vec![c.clone()])).unwrap();

        assert!(cache.cache.contains_key(&b("a")));
        assert!(!cache.cache.contains_key(&b("b")));
        assert!(cache.cache.contains_key(&b("c")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_hits_keep_recent_entries_alive() {
        let mut cache = SegmentationCache::with_capacity(3);
        for w in ["a", "b", "c"] {
            cache.get_or_segment(&b(w), |c| Ok(vec![c.clone()])).unwrap();
        }
        for _ in 0..5 {
            cache.get_or_segment(&b("a"), |_| panic!("should be cached")).unwrap();
        }
        cache.get_or_segment(&b("d"), |c| Ok(vec![c.clone()])).unwrap();
        cache.get_or_segment(&b("e"), |c| Ok(vec![c.clone()])).unwrap();

        assert!(cache.cache.contains_key(&b("a")));
        assert!(!cache.cache.contains_key(&b("b")));
        assert!(!cache.cache.contains_key(&b("c")));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.recency.len(), 3);
    }

    #[test]
    fn test_errors_not_cached() {
        let mut cache: SegmentationCache<Baseline> = SegmentationCache::new();
        let err = cache.get_or_segment(&b("x"), |_| {
            Err(cogmorph_core::MorphError::InvalidConfig("boom".into()))
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let mut cache = SegmentationCache::with_capacity(0);
        cache.get_or_segment(&b("a"), |c| Ok(vec![c.clone()])).unwrap();
        assert!(cache.is_empty());
        assert!(cache.stats().hit_rate.is_some());
    }
}
