//! Free-form string metadata with case-insensitive keys.

use std::collections::{HashMap, hash_map};

/// String to string metadata attached to nodes, edges and models.
///
/// Keys compare case-insensitively: `"Owner"` and `"owner"` address the same
/// entry. The key spelling of the first insertion is kept for iteration.
/// Iteration order is unspecified.
///
/// # Examples
///
/// ```
/// use limn_core::metadata::Metadata;
///
/// let mut metadata = Metadata::new();
/// metadata.insert("Owner", "platform");
/// assert_eq!(metadata.get("OWNER"), Some("platform"));
///
/// metadata.insert("owner", "infra");
/// assert_eq!(metadata.len(), 1);
/// assert_eq!(metadata.get("Owner"), Some("infra"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: HashMap<String, (String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        match self.entries.entry(fold(&key)) {
            hash_map::Entry::Occupied(mut entry) => {
                Some(std::mem::replace(&mut entry.get_mut().1, value.into()))
            }
            hash_map::Entry::Vacant(entry) => {
                entry.insert((key, value.into()));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold(key)).map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&fold(key)).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs, keys as first inserted.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// Folds a key or identifier into its case-insensitive form.
pub fn fold(key: &str) -> String {
    key.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut metadata = Metadata::new();
        assert_eq!(metadata.insert("Directed", "false"), None);

        assert!(metadata.contains_key("directed"));
        assert_eq!(metadata.get("DIRECTED"), Some("false"));
        assert_eq!(metadata.insert("directed", "true"), Some("false".to_string()));
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn test_first_spelling_is_kept() {
        let mut metadata = Metadata::new();
        metadata.insert("Layer", "a");
        metadata.insert("LAYER", "b");

        let entries: Vec<_> = metadata.iter().collect();
        assert_eq!(entries, vec![("Layer", "b")]);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a: Metadata = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: Metadata = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove() {
        let mut metadata: Metadata = [("Team", "core")].into_iter().collect();
        assert_eq!(metadata.remove("team"), Some("core".to_string()));
        assert!(metadata.is_empty());
    }
}
