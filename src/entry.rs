//! GlossaryEntry struct - a single term as published by a glossary source.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A glossary term paired with its definition.
///
/// On the wire the definition travels as `content`, matching what glossary
/// sources publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GlossaryEntry {
    /// The term as authored (case and diacritics preserved)
    pub title: String,
    /// Definition text, may contain inline markup
    #[serde(rename = "content", default)]
    pub definition: String,
}

impl GlossaryEntry {
    /// Create a new entry. The title is trimmed.
    pub fn new(title: impl Into<String>, definition: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            title: title.trim().to_string(),
            definition: definition.into(),
        }
    }

    /// The dedup key for this entry
    pub fn key(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Trimmed, case-folded form of a title used as the identity of an entry.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Parse the entries out of a raw source payload.
///
/// Anything that is not an array yields no entries. Items without a usable
/// `title` are dropped; a missing or non-string `content` becomes an empty
/// definition.
pub fn parse_entries(body: &Value) -> Vec<GlossaryEntry> {
    let Some(items) = body.as_array() else {
        debug!("payload is not a JSON array, skipping");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let entry = parse_entry(item);
            if entry.is_none() {
                debug!(index, "dropping glossary item without a title");
            }
            entry
        })
        .collect()
}

fn parse_entry(item: &Value) -> Option<GlossaryEntry> {
    let object = item.as_object()?;
    let title = object.get("title")?.as_str()?.trim();
    if title.is_empty() {
        return None;
    }
    let definition = object
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(GlossaryEntry::new(title, definition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_trims_and_folds_case() {
        assert_eq!(normalize_title("  New York "), "new york");
        assert_eq!(normalize_title("Ärger"), "ärger");
    }

    #[test]
    fn parse_keeps_well_formed_items_in_order() {
        let body = json!([
            {"title": "Cat", "content": "<p>A small animal.</p>"},
            {"title": "Dog", "content": "Loyal."}
        ]);
        let entries = parse_entries(&body);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Cat");
        assert_eq!(entries[0].definition, "<p>A small animal.</p>");
        assert_eq!(entries[1].title, "Dog");
    }

    #[test]
    fn parse_tolerates_malformed_items() {
        let body = json!([
            {"title": "", "content": "blank"},
            {"title": "   ", "content": "whitespace"},
            {"content": "no title"},
            {"title": 42, "content": "numeric title"},
            "just a string",
            null,
            {"title": " Orphan "},
            {"title": "Numbered", "content": 7}
        ]);
        let entries = parse_entries(&body);
        assert_eq!(
            entries,
            vec![
                GlossaryEntry::new("Orphan", ""),
                GlossaryEntry::new("Numbered", ""),
            ]
        );
    }

    #[test]
    fn parse_rejects_non_array_payloads() {
        assert!(parse_entries(&json!({"title": "Cat"})).is_empty());
        assert!(parse_entries(&json!("Cat")).is_empty());
        assert!(parse_entries(&Value::Null).is_empty());
    }

    #[test]
    fn wire_format_uses_content_field() {
        let entry = GlossaryEntry::new("Cat", "Meows.");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({"title": "Cat", "content": "Meows."}));
    }
}
