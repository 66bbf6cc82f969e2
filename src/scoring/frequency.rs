use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Occurrence counts that remember the order keys were first seen.
///
/// Ties in `most_common` resolve to the key seen first, so rankings built on top of
/// the table are deterministic for a given input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frequency {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Frequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`
    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: usize) {
        match self.index.get(key) {
            Some(&idx) => self.entries[idx].1 += n,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.index
            .get(key)
            .map(|&idx| self.entries[idx].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Up to `n` entries, highest count first; equal counts keep first-seen order
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }

    /// The single most common key
    pub fn top(&self) -> Option<&str> {
        self.most_common(1).first().map(|(key, _)| *key)
    }
}

impl<S: AsRef<str>> FromIterator<S> for Frequency {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut freq = Frequency::new();
        for key in iter {
            freq.add(key.as_ref());
        }
        freq
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_distinct_len() {
        let freq: Frequency = ["Rose", "Lavender", "Rose"].into_iter().collect();
        assert_eq!(freq.get("Rose"), 2);
        assert_eq!(freq.get("Lavender"), 1);
        assert_eq!(freq.get("Basil"), 0);
        assert_eq!(freq.len(), 2);
    }

    #[test]
    fn test_most_common_tie_keeps_first_seen() {
        let freq: Frequency = ["Bergamot", "Lemon", "Lemon", "Bergamot", "Neroli"]
            .into_iter()
            .collect();
        assert_eq!(
            freq.most_common(2),
            vec![("Bergamot", 2), ("Lemon", 2)]
        );
        assert_eq!(freq.top(), Some("Bergamot"));
    }

    #[test]
    fn test_empty_table() {
        let freq = Frequency::new();
        assert!(freq.is_empty());
        assert_eq!(freq.top(), None);
        assert!(freq.most_common(5).is_empty());
        assert_eq!(serde_json::to_string(&freq).unwrap(), "{}");
    }

    #[test]
    fn test_serializes_in_first_seen_order() {
        let freq: Frequency = ["b", "a", "b"].into_iter().collect();
        assert_eq!(serde_json::to_string(&freq).unwrap(), r#"{"b":2,"a":1}"#);
    }
}
