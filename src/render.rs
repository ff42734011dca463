//! Listing output: the whole glossary as a definition list instead of inline
//! annotations.

use crate::aggregator::GlossaryTable;
use crate::markup::{strip_tags, EscapedText};
use colored::Colorize;

/// Render the glossary as an HTML definition list.
///
/// Titles are escaped; definitions are inserted as authored, markup included,
/// since they come from the glossary source rather than from page content.
pub fn render_definition_list(table: &GlossaryTable) -> String {
    let mut out = String::from("<dl class=\"glossary-list\">\n");
    for entry in table {
        out.push_str(&format!(
            "  <dt>{}</dt>\n  <dd>{}</dd>\n",
            EscapedText::escape(&entry.title),
            entry.definition
        ));
    }
    out.push_str("</dl>\n");
    out
}

/// Render the glossary for a terminal, one term per block.
pub fn render_terminal(table: &GlossaryTable) -> String {
    let mut out = String::new();
    for entry in table {
        out.push_str(&format!("{}\n", entry.title.bold()));
        let definition = strip_tags(&entry.definition);
        if definition.is_empty() {
            out.push_str(&format!("  {}\n\n", "(no definition)".dimmed()));
        } else {
            out.push_str(&format!("  {}\n\n", definition));
        }
    }
    out
}
