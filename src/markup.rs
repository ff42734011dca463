//! HTML safety helpers.
//!
//! Raw text never reaches annotation output directly: it has to pass through
//! [`EscapedText::escape`] first. Definitions additionally lose their markup
//! via [`strip_tags`] before being used as tooltips.

use scraper::Html;
use std::fmt;

/// Text that is safe to place in element content and in quoted attribute
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EscapedText(String);

impl EscapedText {
    /// Escape `& < > " '` in raw text.
    pub fn escape(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EscapedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drop all markup from an HTML fragment, keeping its text.
///
/// Character references are decoded, `script`/`style` bodies are dropped and
/// whitespace runs collapse to a single space.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);

    let mut text = String::new();
    for node in fragment.root_element().descendants() {
        if let Some(el) = node.value().as_element() {
            if is_block(el.name()) {
                text.push(' ');
            }
            continue;
        }
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style"))
        });
        if hidden {
            continue;
        }
        let after_block = node
            .prev_sibling()
            .and_then(|sibling| sibling.value().as_element().map(|el| is_block(el.name())))
            .unwrap_or(false);
        if after_block {
            text.push(' ');
        }
        text.push_str(chunk);
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "br"
            | "li"
            | "ul"
            | "ol"
            | "dl"
            | "dt"
            | "dd"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "blockquote"
            | "table"
            | "tr"
            | "td"
            | "th"
            | "section"
            | "article"
    )
}

/// Tooltip text for a definition: markup stripped, then escaped.
pub fn tooltip(definition: &str) -> EscapedText {
    EscapedText::escape(&strip_tags(definition))
}
