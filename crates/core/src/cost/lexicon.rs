//! Construction frequency table.
//!
//! Entries whose count drops to zero are removed, so the table only ever
//! holds constructions that occur in the current segmentation.

use super::Symbol;
use crate::error::{MorphError, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Serde adapter writing a hash map as a key-sorted list of pairs.
///
/// Keeps output deterministic and lets non-string keys through JSON.
pub(crate) mod entries {
    use super::Symbol;
    use ahash::AHashMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(map: &AHashMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Symbol,
        V: Serialize,
        S: Serializer,
    {
        let mut items: Vec<(&K, &V)> = map.iter().collect();
        items.sort_unstable_by(|a, b| a.0.cmp(b.0));
        serializer.collect_seq(items)
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<AHashMap<K, V>, D::Error>
    where
        K: Symbol,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let items: Vec<(K, V)> = Vec::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

/// Mapping from construction to its corpus frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Lexicon<K: Symbol> {
    /// Construction -> count, never zero
    #[serde(with = "entries")]
    counts: AHashMap<K, u64>,
    /// Sum of all counts
    tokens: u64,
}

impl<K: Symbol> Lexicon<K> {
    pub fn new() -> Self {
        Self {
            counts: AHashMap::new(),
            tokens: 0,
        }
    }

    /// Apply `delta` to the count of `key` and return `(old, new)`.
    ///
    /// A delta that would make the count negative is rejected and leaves
    /// the table untouched.
    pub fn update(&mut self, key: &K, delta: i64) -> Result<(u64, u64)> {
        let old = self.count(key);
        let new = old as i64 + delta;
        if new < 0 {
            return Err(MorphError::CostModel(format!(
                "count of {:?} would become negative ({} {:+})",
                key, old, delta
            )));
        }
        let new = new as u64;
        if new == 0 {
            self.counts.remove(key);
        } else {
            self.counts.insert(key.clone(), new);
        }
        self.tokens = self.tokens - old + new;
        Ok((old, new))
    }

    /// Count of `key`, zero if absent.
    pub fn count(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.counts.contains_key(key)
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, &c)| (k, c))
    }

    /// Entries sorted by key, for deterministic output.
    pub fn sorted(&self) -> Vec<(K, u64)> {
        let mut items: Vec<(K, u64)> = self
            .counts
            .iter()
            .map(|(k, &c)| (k.clone(), c))
            .collect();
        items.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        items
    }
}

impl<K: Symbol> Default for Lexicon<K> {
    fn default() -> Self {
        Self::new()
    }
}
