//! Dictionary construction with duplicate detection.

pub mod loader;
pub mod report;

pub use loader::{parse_table_entries, parse_text_entries, DictionaryLoader, DictionarySource};
pub use report::{DuplicateRecord, DuplicateReport, DUPLICATE_REPORT_NAME};

use std::collections::{HashMap, HashSet};

/// One `key -> value` pair as read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub key: String,
    pub value: String,
}

impl DictionaryEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Finished, immutable substitution table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationMap {
    entries: HashMap<String, String>,
}

impl TranslationMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
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

    /// Non-empty keys, longest first; equal lengths in lexical order.
    pub fn keys_by_length(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .entries
            .keys()
            .map(String::as_str)
            .filter(|k| !k.is_empty())
            .collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        keys
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Accumulates entries in source order and tracks repeated keys.
///
/// The latest value always wins in the map. The first repeat of a key also
/// records the key's original occurrence, so every duplicated key reports
/// its first line exactly once however often it repeats.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    entries: HashMap<String, String>,
    first_seen: HashMap<String, (usize, String)>,
    reported_first: HashSet<String>,
    duplicates: Vec<DuplicateRecord>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the entry found at `line` (1-based line or spreadsheet row).
    pub fn insert(&mut self, line: usize, entry: DictionaryEntry) {
        let DictionaryEntry { key, value } = entry;

        if self.entries.contains_key(&key) {
            self.duplicates.push(DuplicateRecord {
                line,
                key: key.clone(),
                value: value.clone(),
            });
            if self.reported_first.insert(key.clone()) {
                if let Some((first_line, first_value)) = self.first_seen.get(&key) {
                    self.duplicates.push(DuplicateRecord {
                        line: *first_line,
                        key: key.clone(),
                        value: first_value.clone(),
                    });
                }
            }
        } else {
            self.first_seen.insert(key.clone(), (line, value.clone()));
        }

        self.entries.insert(key, value);
    }

    pub fn finish(self) -> (TranslationMap, DuplicateReport) {
        (
            TranslationMap {
                entries: self.entries,
            },
            DuplicateReport::new(self.duplicates),
        )
    }
}

/// Build from numbered entries in one go.
pub fn build(
    entries: impl IntoIterator<Item = (usize, DictionaryEntry)>,
) -> (TranslationMap, DuplicateReport) {
    let mut builder = DictionaryBuilder::new();
    for (line, entry) in entries {
        builder.insert(line, entry);
    }
    builder.finish()
}
