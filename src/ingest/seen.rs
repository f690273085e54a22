// src/ingest/seen.rs
use std::collections::{HashSet, VecDeque};

/// Bounded, insertion-ordered set of item keys. Oldest keys are forgotten
/// first once `capacity` is exceeded. In memory only: a restart forgets all.
#[derive(Debug, Clone)]
pub struct SeenItems {
    capacity: usize,
    order: VecDeque<String>,
    keys: HashSet<String>,
}

impl SeenItems {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            keys: HashSet::with_capacity(capacity),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Returns false if the key was already present.
    pub fn insert(&mut self, key: String) -> bool {
        if !self.keys.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.keys.remove(&old);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_duplicates() {
        let mut s = SeenItems::with_capacity(10);
        assert!(s.insert("a".into()));
        assert!(!s.insert("a".into()));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn oldest_keys_are_evicted() {
        let mut s = SeenItems::with_capacity(2);
        s.insert("a".into());
        s.insert("b".into());
        s.insert("c".into());
        assert!(!s.contains("a"));
        assert!(s.contains("b") && s.contains("c"));
        assert_eq!(s.len(), 2);
    }
}
