use std::collections::BTreeSet;

use uuid::Uuid;

use crate::domain::Item;

/// A set of stable item keys (read or starred).
///
/// Marks are independent of the item cache: a key stays marked after its
/// item has been evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(BTreeSet<String>);

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.0.contains(item.stable_key())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Returns true if the key was not present before.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    /// Flip membership; returns the new state.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.0.remove(key) {
            false
        } else {
            self.0.insert(key.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for KeySet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Which items the reader shows. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedFilter {
    #[default]
    All,
    Starred,
    Source(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut set = KeySet::new();
        assert!(set.toggle("https://example.com/a"));
        assert!(set.contains_key("https://example.com/a"));
        assert!(!set.toggle("https://example.com/a"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_insert_reports_novelty() {
        let mut set = KeySet::new();
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert_eq!(set.len(), 1);
    }
}
