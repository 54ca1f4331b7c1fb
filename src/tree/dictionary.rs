//! Page dictionary and local path set.

use crate::types::PageId;
use std::collections::{HashMap, HashSet};

/// Normalized local file name → remote page id.
///
/// Filled while planning a remote tree, then shared read-only for the rest of
/// the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDictionary {
    entries: HashMap<String, PageId>,
}

impl PageDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping, returning the page id it replaced, if any.
    pub fn insert(&mut self, file_name: impl Into<String>, page_id: impl Into<PageId>) -> Option<PageId> {
        self.entries.insert(file_name.into(), page_id.into())
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.entries.get(file_name).map(String::as_str)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.entries.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<PageId>> FromIterator<(K, V)> for PageDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Relative, `/`-separated file paths under the base directory.
///
/// Keeps first-insertion order and drops duplicates, so revisiting a file
/// during a second pass is harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalPathSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl LocalPathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the path was already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.order.push(path);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Paths present here but not in `other`, in this set's order.
    pub fn difference<'a>(&'a self, other: &'a LocalPathSet) -> impl Iterator<Item = &'a str> {
        self.iter().filter(move |p| !other.contains(p))
    }
}

impl<S: Into<String>> FromIterator<S> for LocalPathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = LocalPathSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_insert_replaces() {
        let mut dict = PageDictionary::new();
        assert_eq!(dict.insert("home.js", "p1"), None);
        assert_eq!(dict.insert("home.js", "p2"), Some("p1".to_string()));
        assert_eq!(dict.get("home.js"), Some("p2"));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_path_set_dedupes_and_keeps_order() {
        let mut set = LocalPathSet::new();
        assert!(set.insert("b.js"));
        assert!(set.insert("a.js"));
        assert!(!set.insert("b.js"));
        let paths: Vec<&str> = set.iter().collect();
        assert_eq!(paths, vec!["b.js", "a.js"]);
    }

    #[test]
    fn test_path_set_difference() {
        let local: LocalPathSet = ["a", "b"].into_iter().collect();
        let remote: LocalPathSet = ["b", "c"].into_iter().collect();
        assert_eq!(local.difference(&remote).collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(remote.difference(&local).collect::<Vec<_>>(), vec!["c"]);
    }
}
