//! Ordered simulation results.

use std::collections::HashMap;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Destination URL to verdict (`true` = allowed), in simulation order.
///
/// Writing a URL that is already present replaces its verdict but keeps the
/// position it was first inserted at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decisions {
    entries: Vec<(String, bool)>,
    index: HashMap<String, usize>,
}

impl Decisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a verdict, returning the one it replaced.
    pub fn insert(&mut self, url: String, allowed: bool) -> Option<bool> {
        if let Some(&pos) = self.index.get(&url) {
            let previous = self.entries[pos].1;
            self.entries[pos].1 = allowed;
            return Some(previous);
        }

        self.index.insert(url.clone(), self.entries.len());
        self.entries.push((url, allowed));
        None
    }

    pub fn get(&self, url: &str) -> Option<bool> {
        self.index.get(url).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.entries.iter().map(|(url, allowed)| (url.as_str(), *allowed))
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(url, _)| url.as_str())
    }

    /// Keep only the URLs `pattern` matches somewhere.
    pub fn retain_matching(&mut self, pattern: &Regex) {
        self.entries.retain(|(url, _)| pattern.is_match(url));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, (url, _))| (url.clone(), pos))
            .collect();
    }
}

impl Serialize for Decisions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (url, allowed) in &self.entries {
            map.serialize_entry(url, allowed)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a Decisions {
    type Item = (&'a str, bool);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, bool)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Decisions {
        let mut decisions = Decisions::new();
        decisions.insert("http://foo.com".to_string(), true);
        decisions.insert("http://bar.com".to_string(), false);
        decisions.insert("http://bar.com/baz".to_string(), true);
        decisions
    }

    #[test]
    fn keeps_insertion_order() {
        let decisions = sample();
        let urls: Vec<&str> = decisions.urls().collect();
        assert_eq!(urls, vec!["http://foo.com", "http://bar.com", "http://bar.com/baz"]);
    }

    #[test]
    fn overwrite_keeps_first_position() {
        let mut decisions = sample();
        assert_eq!(decisions.insert("http://foo.com".to_string(), false), Some(true));
        assert_eq!(decisions.len(), 3);
        assert_eq!(decisions.iter().next(), Some(("http://foo.com", false)));
        assert_eq!(decisions.get("http://foo.com"), Some(false));
    }

    #[test]
    fn retain_matching_searches_anywhere() {
        let mut decisions = sample();
        decisions.retain_matching(&Regex::new("bar").unwrap());
        assert_eq!(decisions.len(), 2);
        assert!(!decisions.contains("http://foo.com"));
        assert_eq!(decisions.get("http://bar.com/baz"), Some(true));

        decisions.insert("http://qux.com".to_string(), true);
        assert_eq!(decisions.urls().last(), Some("http://qux.com"));
    }

    #[test]
    fn serializes_as_ordered_object() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"http://foo.com":true,"http://bar.com":false,"http://bar.com/baz":true}"#);
    }
}
