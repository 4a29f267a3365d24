//! Most-common reports over frequency tables.

use dary_heap::OctonaryHeap;
use std::cmp::{Ordering, Reverse};

/// A key and its frequency, ordered by count and then by key ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Ranked<K: Ord> {
    count: u64,
    key: Reverse<K>,
}

impl<K: Ord> Ord for Ranked<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher count first; equal counts pop the smaller key first.
        self.count
            .cmp(&other.count)
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl<K: Ord> PartialOrd for Ranked<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of keyed frequencies.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
pub struct FrequencyQueue<K: Ord> {
    heap: OctonaryHeap<Ranked<K>>,
}

impl<K: Ord> FrequencyQueue<K> {
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
        }
    }

    /// Add a key; zero counts are ignored.
    pub fn push(&mut self, key: K, count: u64) {
        if count > 0 {
            self.heap.push(Ranked {
                count,
                key: Reverse(key),
            });
        }
    }

    /// Pop the most frequent key.
    pub fn pop(&mut self) -> Option<(K, u64)> {
        self.heap.pop().map(|r| (r.key.0, r.count))
    }

    pub fn peek(&self) -> Option<(&K, u64)> {
        self.heap.peek().map(|r| (&r.key.0, r.count))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain in descending frequency order, at most `limit` entries.
    pub fn into_sorted(mut self, limit: Option<usize>) -> Vec<(K, u64)> {
        let n = limit.unwrap_or(self.heap.len()).min(self.heap.len());
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.pop() {
                Some(entry) => out.push(entry),
                None => break,
            }
        }
        out
    }
}

impl<K: Ord> Default for FrequencyQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> FromIterator<(K, u64)> for FrequencyQueue<K> {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut queue = Self::new();
        for (key, count) in iter {
            queue.push(key, count);
        }
        queue
    }
}

/// Entries of `items` in descending frequency, ties broken by key.
pub fn most_common<K: Ord>(
    items: impl IntoIterator<Item = (K, u64)>,
    limit: Option<usize>,
) -> Vec<(K, u64)> {
    items
        .into_iter()
        .collect::<FrequencyQueue<K>>()
        .into_sorted(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_order() {
        let mut q = FrequencyQueue::new();
        q.push("b", 2);
        q.push("a", 5);
        q.push("c", 2);
        assert_eq!(q.pop(), Some(("a", 5)));
        assert_eq!(q.pop(), Some(("b", 2)));
        assert_eq!(q.pop(), Some(("c", 2)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_zero_counts_skipped() {
        let q: FrequencyQueue<&str> = vec![("a", 0), ("b", 1)].into_iter().collect();
        assert_eq!(q.len(), 1);
        assert_eq!(q.peek(), Some((&"b", 1)));
    }

    #[test]
    fn test_most_common_limit() {
        let items = vec![("x", 1), ("y", 3), ("z", 2)];
        assert_eq!(most_common(items.clone(), Some(2)), vec![("y", 3), ("z", 2)]);
        assert_eq!(most_common(items, None).len(), 3);
    }
}
