//! Insertion-ordered string map for EXTINF and `#EXTM3U` attributes.
//!
//! Playlists are re-emitted in the order attributes were first seen, and
//! overwriting a key keeps its original position.

use indexmap::IndexMap;

/// Attribute map; equality also compares entry order
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: IndexMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or overwrite; returns the previous value if the key existed
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Sort entries by key (byte-wise)
    pub fn sort_keys(&mut self) {
        self.entries.sort_keys();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        attributes.extend(iter);
        attributes
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Attributes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_position() {
        let mut attrs: Attributes = [("b", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(attrs.insert("b", "3"), Some("1".to_string()));

        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(attrs.get("b"), Some("3"));
    }

    #[test]
    fn test_remove_and_sort() {
        let mut attrs: Attributes = [("tvg-name", "x"), ("group-title", "g"), ("tvg-id", "i")]
            .into_iter()
            .collect();
        assert_eq!(attrs.remove("tvg-name"), Some("x".to_string()));
        assert_eq!(attrs.remove("missing"), None);

        attrs.sort_keys();
        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["group-title", "tvg-id"]);
    }

    #[test]
    fn test_equality_respects_order() {
        let forward: Attributes = [("a", "1"), ("b", "2")].into_iter().collect();
        let backward: Attributes = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_ne!(forward, backward);
        assert_eq!(forward, forward.clone());
    }
}
