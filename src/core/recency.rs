//! Bounded recency set for cross-window dedup
//!
//! Remembers the digests of the most recently flushed records so a
//! record straddling two adjacent windows is emitted once. Capacity is
//! bounded with least-recently-added eviction; records are flushed in
//! chunk order, so a duplicate's sibling is always among the most
//! recent insertions.

use std::collections::{HashSet, VecDeque};

/// Default capacity of the orchestrator's dedup set
pub const DEFAULT_RECENCY_CAPACITY: usize = 100_000;

/// Fixed-capacity set of recently seen digests
pub struct RecencySet {
    capacity: usize,
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl RecencySet {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            seen: HashSet::with_capacity(capacity.min(DEFAULT_RECENCY_CAPACITY)),
            order: VecDeque::new(),
        }
    }

    /// Record a digest; returns `false` if it was already present
    pub fn insert(&mut self, digest: String) -> bool {
        if self.seen.contains(&digest) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(digest.clone());
        self.order.push_back(digest);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_detected() {
        let mut set = RecencySet::new(10);
        assert!(set.insert("a".to_string()));
        assert!(!set.insert("a".to_string()));
        assert!(set.insert("b".to_string()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_least_recently_added_evicted() {
        let mut set = RecencySet::new(3);
        assert!(set.insert("a".to_string()));
        assert!(set.insert("b".to_string()));
        assert!(set.insert("c".to_string()));
        assert!(set.insert("d".to_string()));

        assert_eq!(set.len(), 3);
        // "a" fell out, so it counts as new again
        assert!(set.insert("a".to_string()));
        // "c" and "d" are still present
        assert!(!set.insert("c".to_string()));
        assert!(!set.insert("d".to_string()));
    }

    #[test]
    fn test_duplicate_insert_does_not_refresh_order() {
        let mut set = RecencySet::new(2);
        set.insert("a".to_string());
        set.insert("b".to_string());
        // Re-inserting "a" is a no-op; it stays the eviction candidate
        assert!(!set.insert("a".to_string()));
        set.insert("c".to_string());
        assert!(set.insert("a".to_string()));
    }
}
