//! Insertion-ordered, key-indexed entity storage.

use std::collections::HashMap;

/// Entities indexed by key, remembering the order they were first added.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    order: Vec<String>,
    index: HashMap<String, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Clone> Collection<T> {
    /// Insert or replace. A replaced entity keeps its original position.
    pub fn insert(&mut self, key: String, value: T) -> Option<T> {
        if !self.index.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.index.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        let removed = self.index.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.index.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|k| self.index.get(k))
    }

    /// Mutable values in no particular order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.index.values_mut()
    }

    /// Owned copy of the key index.
    pub fn snapshot(&self) -> HashMap<String, T> {
        self.index.clone()
    }

    /// Owned copy of the values in insertion order.
    pub fn to_list(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}
