//! Merging of glossary payloads from several sources into one table.
//!
//! Deduplication is first-wins on the normalized title: sources are taken in
//! the order they are supplied (configuration order) and entries within a
//! source in array order. A later entry whose title differs only in case or
//! surrounding whitespace never replaces an earlier one.

use crate::entry::{normalize_title, parse_entries, GlossaryEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// A raw glossary payload as received from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePayload {
    /// Where the payload came from (normally the endpoint URL)
    pub source: String,
    /// The decoded JSON body, unchecked
    pub body: Value,
}

impl SourcePayload {
    pub fn new(source: impl Into<String>, body: Value) -> Self {
        Self {
            source: source.into(),
            body,
        }
    }
}

/// Ordered set of glossary entries, unique by normalized title.
#[derive(Debug, Clone, Default)]
pub struct GlossaryTable {
    entries: Vec<GlossaryEntry>,
    index: HashMap<String, usize>,
}

impl GlossaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless one with the same normalized title exists.
    ///
    /// Returns `true` if the entry was added.
    pub fn insert(&mut self, entry: GlossaryEntry) -> bool {
        let key = entry.key();
        if key.is_empty() || self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Look up an entry by title, in any casing.
    pub fn get(&self, title: &str) -> Option<&GlossaryEntry> {
        self.index
            .get(&normalize_title(title))
            .map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GlossaryEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }
}

impl FromIterator<GlossaryEntry> for GlossaryTable {
    fn from_iter<I: IntoIterator<Item = GlossaryEntry>>(iter: I) -> Self {
        let mut table = GlossaryTable::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

impl<'a> IntoIterator for &'a GlossaryTable {
    type Item = &'a GlossaryEntry;
    type IntoIter = std::slice::Iter<'a, GlossaryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for GlossaryTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// Merge payloads into a single table, first occurrence wins.
pub fn merge<'a, I>(payloads: I) -> GlossaryTable
where
    I: IntoIterator<Item = &'a SourcePayload>,
{
    let mut table = GlossaryTable::new();
    let mut sources = 0usize;

    for payload in payloads {
        sources += 1;
        let mut added = 0usize;
        let mut duplicates = 0usize;
        for entry in parse_entries(&payload.body) {
            if table.insert(entry) {
                added += 1;
            } else {
                duplicates += 1;
            }
        }
        debug!(source = %payload.source, added, duplicates, "merged glossary source");
    }

    info!(sources, terms = table.len(), "glossary table built");
    table
}
