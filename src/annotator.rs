//! Term annotation engine.
//!
//! Annotation runs in two phases. [`TermMatcher::compile`] turns a
//! [`GlossaryTable`] into one case-insensitive alternation, longest titles
//! first, and [`TermMatcher::apply`] scans content left to right and wraps
//! every whole-word match in a tooltip element.
//!
//! Only text outside markup is scanned. Tags, comments, character references,
//! raw-text elements (`script`, `style`, `textarea`, `title`) and the inside of
//! elements that already carry the annotation class are left untouched, so
//! annotating annotated content adds nothing.

use crate::aggregator::GlossaryTable;
use crate::entry::GlossaryEntry;
use crate::markup::{tooltip, EscapedText};
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, warn};

/// Class carried by annotation elements unless configured otherwise
pub const DEFAULT_CLASS_NAME: &str = "glossary-term";

/// Upper bound on the compiled alternation, large enough for tens of
/// thousands of titles.
const PATTERN_SIZE_LIMIT: usize = 64 * 1024 * 1024;

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Named references that decode to punctuation or spacing rather than to a
/// word character.
const PUNCTUATION_REFERENCES: &[&str] = &[
    "amp", "lt", "gt", "quot", "apos", "nbsp", "ensp", "emsp", "thinsp", "shy", "ndash",
    "mdash", "hellip", "lsquo", "rsquo", "sbquo", "ldquo", "rdquo", "bdquo", "laquo", "raquo",
    "middot", "bull", "copy", "reg", "trade", "sect", "para", "dagger", "Dagger", "iexcl",
    "iquest", "colon", "comma", "period", "excl", "quest", "semi", "lpar", "rpar", "sol",
];

lazy_static! {
    static ref CHAR_REFERENCE: Regex =
        Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap();
    static ref CLASS_ATTRIBUTE: Regex =
        Regex::new(r#"(?i)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#).unwrap();
    static ref WORD_CHAR: Regex = Regex::new(r"^\w$").unwrap();
}

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("failed to compile term pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Options controlling the emitted markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotateOptions {
    /// CSS class of the wrapping element, also used to recognise existing
    /// annotations
    pub class_name: String,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_CLASS_NAME.to_string(),
        }
    }
}

/// A located match of a glossary entry inside content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpan<'a> {
    /// Byte offset of the first matched byte
    pub start: usize,
    /// Byte offset one past the last matched byte
    pub end: usize,
    /// The entry whose title matched
    pub entry: &'a GlossaryEntry,
    /// The matched text, in the casing found in the content
    pub matched: &'a str,
    term: usize,
}

impl AnnotationSpan<'_> {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

struct CompiledTerm {
    entry: GlossaryEntry,
    tooltip: EscapedText,
}

/// A compiled glossary matcher, reusable across any number of documents.
pub struct TermMatcher {
    regex: Option<Regex>,
    terms: Vec<CompiledTerm>,
    class_name: String,
}

impl TermMatcher {
    /// Compile a matcher with the default options
    pub fn compile(table: &GlossaryTable) -> Result<Self, AnnotateError> {
        Self::compile_with(table, &AnnotateOptions::default())
    }

    /// Compile a matcher for the titles in `table`.
    ///
    /// Titles are ordered by descending length in characters, ties keeping
    /// table order, so that with leftmost-first alternation the longer of two
    /// candidates starting at the same position wins.
    pub fn compile_with(
        table: &GlossaryTable,
        options: &AnnotateOptions,
    ) -> Result<Self, AnnotateError> {
        let mut entries: Vec<&GlossaryEntry> = table.iter().collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.title.chars().count()));

        let terms: Vec<CompiledTerm> = entries
            .into_iter()
            .filter(|entry| !entry.title.trim().is_empty())
            .map(|entry| CompiledTerm {
                entry: entry.clone(),
                tooltip: tooltip(&entry.definition),
            })
            .collect();

        let regex = if terms.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = terms
                .iter()
                .map(|term| title_pattern(&term.entry.title))
                .collect();
            let pattern = format!("(?i)(?:{})", alternatives.join("|"));
            let regex = RegexBuilder::new(&pattern)
                .size_limit(PATTERN_SIZE_LIMIT)
                .dfa_size_limit(PATTERN_SIZE_LIMIT)
                .build()?;
            Some(regex)
        };

        debug!(terms = terms.len(), "compiled term matcher");
        Ok(Self {
            regex,
            terms,
            class_name: options.class_name.clone(),
        })
    }

    /// Number of terms the matcher knows
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Find all annotation spans in `content`, sorted and non-overlapping.
    pub fn find_spans<'a>(&'a self, content: &'a str) -> Vec<AnnotationSpan<'a>> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };

        let regions = segment(content, &self.class_name);
        let mut spans = Vec::new();
        let mut pos = 0;

        while pos < content.len() {
            let Some(caps) = regex.captures_at(content, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };

            let index = regions.partition_point(|region| region.range.end <= whole.start());
            let Some(region) = regions.get(index) else {
                break;
            };

            if region.kind != RegionKind::Text {
                pos = region.range.end;
                continue;
            }

            let glued_before = whole.start() == region.range.start
                && index > 0
                && regions[index - 1].kind.is_wordlike();
            let glued_after = whole.end() == region.range.end
                && regions
                    .get(index + 1)
                    .is_some_and(|next| next.kind.is_wordlike());

            if whole.end() > region.range.end || glued_before || glued_after {
                pos = next_char_boundary(content, whole.start());
                continue;
            }

            match caps.iter().skip(1).position(|group| group.is_some()) {
                Some(term) => spans.push(AnnotationSpan {
                    start: whole.start(),
                    end: whole.end(),
                    entry: &self.terms[term].entry,
                    matched: whole.as_str(),
                    term,
                }),
                None => warn!(matched = whole.as_str(), "match without a term group"),
            }
            pos = whole.end();
        }

        spans
    }

    /// Annotate `content`, returning it unchanged when nothing matches.
    pub fn apply(&self, content: &str) -> String {
        self.apply_counted(content).0
    }

    /// Like [`apply`](Self::apply), also returning the number of annotations
    /// inserted.
    pub fn apply_counted(&self, content: &str) -> (String, usize) {
        let spans = self.find_spans(content);
        if spans.is_empty() {
            return (content.to_string(), 0);
        }

        let class = EscapedText::escape(&self.class_name);
        let mut out = String::with_capacity(content.len() + spans.len() * 64);
        let mut last = 0;
        for span in &spans {
            out.push_str(&content[last..span.start]);
            let tip = &self.terms[span.term].tooltip;
            out.push_str(&format!(
                r#"<span class="{}" title="{}">{}</span>"#,
                class,
                tip,
                EscapedText::escape(span.matched)
            ));
            last = span.end;
        }
        out.push_str(&content[last..]);

        debug!(spans = spans.len(), "annotated content");
        (out, spans.len())
    }
}

/// Annotate `content` with the terms of `table` using default options.
pub fn annotate(content: &str, table: &GlossaryTable) -> String {
    annotate_with(content, table, &AnnotateOptions::default())
}

/// Annotate `content`, degrading to the unchanged content if the matcher
/// cannot be built.
pub fn annotate_with(content: &str, table: &GlossaryTable, options: &AnnotateOptions) -> String {
    if table.is_empty() {
        return content.to_string();
    }
    match TermMatcher::compile_with(table, options) {
        Ok(matcher) => matcher.apply(content),
        Err(e) => {
            warn!("glossary annotation skipped: {}", e);
            content.to_string()
        }
    }
}

/// Regex for one title: escaped words joined by any whitespace run, with a
/// boundary assertion on each edge that requires a non-word neighbour.
fn title_pattern(title: &str) -> String {
    let title = title.trim();
    let body = title
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let leading = edge_assertion(title.chars().next());
    let trailing = edge_assertion(title.chars().next_back());
    format!("{leading}({body}){trailing}")
}

fn edge_assertion(edge: Option<char>) -> &'static str {
    match edge {
        Some(c) if is_word_char(c) => r"\b",
        _ => r"\B",
    }
}

/// Word characters as `\b` sees them (Unicode `\w`), so edge assertions
/// agree with the engine on digits like `₂` and on combining marks.
fn is_word_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    WORD_CHAR.is_match(c.encode_utf8(&mut buf))
}

fn next_char_boundary(content: &str, at: usize) -> usize {
    content[at..]
        .chars()
        .next()
        .map_or(content.len(), |c| at + c.len_utf8())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionKind {
    /// Scannable text
    Text,
    /// Tags, comments and whole skipped elements
    Markup,
    /// A character reference such as `&amp;`
    Reference { wordlike: bool },
}

impl RegionKind {
    fn is_wordlike(self) -> bool {
        matches!(self, RegionKind::Reference { wordlike: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    range: Range<usize>,
    kind: RegionKind,
}

/// Split content into contiguous text and protected regions.
fn segment(content: &str, class_name: &str) -> Vec<Region> {
    let bytes = content.as_bytes();
    let mut regions = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    let push_text = |regions: &mut Vec<Region>, start: usize, end: usize| {
        if start < end {
            regions.push(Region {
                range: start..end,
                kind: RegionKind::Text,
            });
        }
    };

    while i < bytes.len() {
        let protected = match bytes[i] {
            b'<' => parse_tag(content, i)
                .map(|tag| (protected_end(content, &tag, class_name), RegionKind::Markup)),
            b'&' => CHAR_REFERENCE.find(&content[i..]).map(|m| {
                let reference = &content[i..i + m.end()];
                (
                    i + m.end(),
                    RegionKind::Reference {
                        wordlike: reference_is_wordlike(reference),
                    },
                )
            }),
            _ => None,
        };

        match protected {
            Some((end, kind)) => {
                push_text(&mut regions, text_start, i);
                regions.push(Region { range: i..end, kind });
                i = end;
                text_start = end;
            }
            None => i += 1,
        }
    }
    push_text(&mut regions, text_start, bytes.len());

    regions
}

#[derive(Debug, PartialEq, Eq)]
enum TagKind<'c> {
    Open {
        name: String,
        attrs: &'c str,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    /// Comments, doctype, processing instructions
    Other,
}

#[derive(Debug, PartialEq, Eq)]
struct Tag<'c> {
    end: usize,
    kind: TagKind<'c>,
}

/// Parse the tag starting at `start` (which must hold `<`).
///
/// Returns `None` when the `<` does not open a tag and should be read as text.
fn parse_tag(content: &str, start: usize) -> Option<Tag<'_>> {
    let bytes = content.as_bytes();
    let rest = &content[start..];

    if rest.starts_with("<!--") {
        let end = rest[4..]
            .find("-->")
            .map_or(content.len(), |offset| start + 4 + offset + 3);
        return Some(Tag {
            end,
            kind: TagKind::Other,
        });
    }

    match *bytes.get(start + 1)? {
        b'!' | b'?' => {
            let end = find_tag_end(bytes, start + 2)?;
            Some(Tag {
                end,
                kind: TagKind::Other,
            })
        }
        b'/' => {
            let name_start = start + 2;
            if !bytes.get(name_start)?.is_ascii_alphabetic() {
                return None;
            }
            let name_end = scan_name(bytes, name_start);
            let end = find_tag_end(bytes, name_end)?;
            Some(Tag {
                end,
                kind: TagKind::Close {
                    name: content[name_start..name_end].to_ascii_lowercase(),
                },
            })
        }
        c if c.is_ascii_alphabetic() => {
            let name_start = start + 1;
            let name_end = scan_name(bytes, name_start);
            let end = find_tag_end(bytes, name_end)?;
            let attrs = &content[name_end..end - 1];
            Some(Tag {
                end,
                kind: TagKind::Open {
                    name: content[name_start..name_end].to_ascii_lowercase(),
                    attrs,
                    self_closing: attrs.trim_end().ends_with('/'),
                },
            })
        }
        _ => None,
    }
}

fn scan_name(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'-' || *b == b':'))
        .map_or(bytes.len(), |offset| from + offset)
}

/// Offset just past the `>` closing a tag, skipping quoted attribute values.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote = None;
    for (offset, &b) in bytes[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(from + offset + 1),
            None => {}
        }
    }
    None
}

/// End of the protected region opened by `tag`: the tag itself, or the whole
/// element for raw-text elements and existing annotations.
fn protected_end(content: &str, tag: &Tag<'_>, class_name: &str) -> usize {
    match &tag.kind {
        TagKind::Open {
            name,
            attrs,
            self_closing: false,
        } => {
            if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                raw_text_end(content, name, tag.end)
            } else if has_class(attrs, class_name) {
                element_end(content, name, tag.end)
            } else {
                tag.end
            }
        }
        _ => tag.end,
    }
}

/// Raw-text elements end at the first matching close tag, whatever comes
/// before it.
fn raw_text_end(content: &str, name: &str, from: usize) -> usize {
    let bytes = content.as_bytes();
    let mut pos = from;
    while let Some(offset) = content[pos..].find("</") {
        let at = pos + offset;
        let name_start = at + 2;
        let name_end = name_start + name.len();
        let matches_name = bytes
            .get(name_start..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        let terminated = bytes
            .get(name_end)
            .map_or(true, |b| !(b.is_ascii_alphanumeric() || *b == b'-'));
        if matches_name && terminated {
            return find_tag_end(bytes, name_end).unwrap_or(content.len());
        }
        pos = at + 2;
    }
    content.len()
}

/// End of an element, counting nested elements of the same name.
fn element_end(content: &str, name: &str, from: usize) -> usize {
    let mut depth = 1usize;
    let mut pos = from;
    while let Some(offset) = content[pos..].find('<') {
        let at = pos + offset;
        match parse_tag(content, at) {
            Some(tag) => {
                match &tag.kind {
                    TagKind::Open {
                        name: open,
                        self_closing: false,
                        ..
                    } if open == name => depth += 1,
                    TagKind::Close { name: close } if close == name => {
                        depth -= 1;
                        if depth == 0 {
                            return tag.end;
                        }
                    }
                    _ => {}
                }
                pos = tag.end;
            }
            None => pos = at + 1,
        }
    }
    content.len()
}

fn has_class(attrs: &str, class_name: &str) -> bool {
    CLASS_ATTRIBUTE.captures(attrs).is_some_and(|caps| {
        let value = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        value.split_whitespace().any(|class| class == class_name)
    })
}

/// Whether a character reference stands for a word character.
fn reference_is_wordlike(reference: &str) -> bool {
    let body = reference.trim_start_matches('&').trim_end_matches(';');
    match body.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => number.parse().ok(),
            };
            code.and_then(char::from_u32).is_some_and(is_word_char)
        }
        None => !PUNCTUATION_REFERENCES.contains(&body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(terms: &[(&str, &str)]) -> GlossaryTable {
        terms
            .iter()
            .map(|(title, definition)| GlossaryEntry::new(*title, *definition))
            .collect()
    }

    fn matched<'a>(spans: &[AnnotationSpan<'a>]) -> Vec<&'a str> {
        spans.iter().map(|span| span.matched).collect()
    }

    #[test]
    fn empty_table_never_matches() {
        let matcher = TermMatcher::compile(&GlossaryTable::new()).unwrap();
        assert!(matcher.is_empty());
        assert!(matcher.find_spans("anything at all").is_empty());
        assert_eq!(matcher.apply("<p>anything</p>"), "<p>anything</p>");
    }

    #[test]
    fn matches_whole_words_only() {
        let matcher = TermMatcher::compile(&table(&[("cat", "Animal")])).unwrap();
        let spans = matcher.find_spans("cat category concat cat_ cat.");
        assert_eq!(matched(&spans), ["cat", "cat"]);
        assert_eq!(spans[0].range(), 0..3);
        assert_eq!(spans[1].range(), 25..28);
    }

    #[test]
    fn apply_counted_reports_inserted_annotations() {
        let matcher = TermMatcher::compile(&table(&[("cat", "Animal")])).unwrap();
        let (out, count) = matcher.apply_counted("cat and cat, not category");
        assert_eq!(count, 2);
        assert_eq!(out, matcher.apply("cat and cat, not category"));

        let (unchanged, none) = matcher.apply_counted("<p>dogs</p>");
        assert_eq!((unchanged.as_str(), none), ("<p>dogs</p>", 0));
    }

    #[test]
    fn matching_ignores_case_and_keeps_content_casing() {
        let matcher = TermMatcher::compile(&table(&[("world", "Planet")])).unwrap();
        let out = matcher.apply("Hello WORLD");
        assert_eq!(
            out,
            r#"Hello <span class="glossary-term" title="Planet">WORLD</span>"#
        );
    }

    #[test]
    fn longer_titles_win_regardless_of_table_order() {
        let matcher =
            TermMatcher::compile(&table(&[("York", "City"), ("New York", "Big city")])).unwrap();
        let spans = matcher.find_spans("I live in New York.");
        assert_eq!(matched(&spans), ["New York"]);
        assert_eq!(spans[0].entry.title, "New York");
    }

    #[test]
    fn equal_length_titles_keep_table_order() {
        let matcher = TermMatcher::compile(&table(&[("ab cd", "first"), ("ab-cd", "second")]))
            .unwrap();
        let titles: Vec<_> = matcher.terms.iter().map(|t| t.entry.title.as_str()).collect();
        assert_eq!(titles, ["ab cd", "ab-cd"]);
    }

    #[test]
    fn multi_word_titles_span_any_whitespace() {
        let matcher = TermMatcher::compile(&table(&[("New York", "City")])).unwrap();
        let spans = matcher.find_spans("New\n   York");
        assert_eq!(matched(&spans), ["New\n   York"]);
    }

    #[test]
    fn subscript_and_superscript_edges_are_whole_words() {
        let matcher =
            TermMatcher::compile(&table(&[("CO₂", "Carbon dioxide"), ("m²", "Square metre")]))
                .unwrap();
        let spans = matcher.find_spans("CO₂ emissions per m², not CO₂x or m²s.");
        assert_eq!(matched(&spans), ["CO₂", "m²"]);
        assert_eq!(spans[0].start, 0);
        assert!(matcher.apply("CO₂ emissions rise.").contains(">CO₂</span>"));
    }

    #[test]
    fn combining_mark_edges_are_whole_words() {
        let matcher = TermMatcher::compile(&table(&[("cafe\u{301}", "Coffee house")])).unwrap();
        assert_eq!(matcher.find_spans("a cafe\u{301} au lait").len(), 1);
        assert!(matcher.find_spans("two cafe\u{301}s").is_empty());
    }

    #[test]
    fn word_chars_follow_the_regex_engine() {
        assert!(is_word_char('a'));
        assert!(is_word_char('_'));
        assert!(is_word_char('7'));
        assert!(is_word_char('\u{301}'));
        assert!(!is_word_char('₂'));
        assert!(!is_word_char('½'));
        assert!(!is_word_char('+'));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let matcher = TermMatcher::compile(&table(&[
            ("C++", "Language"),
            ("a.b", "Dotted"),
            ("(x)", "Parenthesised"),
        ]))
        .unwrap();
        let spans = matcher.find_spans("C++ and C++x and axb and a.b and (x)!");
        assert_eq!(matched(&spans), ["C++", "a.b", "(x)"]);
    }

    #[test]
    fn tags_and_attributes_are_never_scanned() {
        let matcher = TermMatcher::compile(&table(&[("title", "Heading"), ("href", "Link")]))
            .unwrap();
        let content = r#"<a href="x" title="title">a title</a><!-- title -->"#;
        let spans = matcher.find_spans(content);
        assert_eq!(spans.len(), 1);
        assert_eq!(&content[spans[0].range()], "title");
        assert_eq!(spans[0].start, content.find("a title").unwrap() + 2);
    }

    #[test]
    fn raw_text_elements_are_skipped() {
        let matcher = TermMatcher::compile(&table(&[("cat", "Animal")])).unwrap();
        let content = "<script>var cat = 1;</script><style>.cat{}</style>cat";
        let spans = matcher.find_spans(content);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, content.len() - 3);
    }

    #[test]
    fn existing_annotations_are_skipped_with_nesting() {
        let matcher = TermMatcher::compile(&table(&[("cat", "Animal")])).unwrap();
        let content = concat!(
            r#"<span class="note glossary-term" title="x"><span>cat</span> cat</span>"#,
            " cat"
        );
        let spans = matcher.find_spans(content);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, content.len() - 3);
    }

    #[test]
    fn character_references_are_protected() {
        let matcher = TermMatcher::compile(&table(&[("amp", "Amplifier"), ("caf", "x")]))
            .unwrap();
        assert!(matcher.find_spans("Fish &amp; chips").is_empty());
        assert!(matcher.find_spans("caf&eacute; caf&#233;").is_empty());
        let spans = matcher.find_spans("an amp&nbsp;here");
        assert_eq!(matched(&spans), ["amp"]);
    }

    #[test]
    fn stray_angle_brackets_are_text() {
        let matcher = TermMatcher::compile(&table(&[("b", "Letter")])).unwrap();
        let spans = matcher.find_spans("a < b and b<");
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn output_escapes_term_and_tooltip() {
        let matcher = TermMatcher::compile(&table(&[(
            "R&D",
            r#"<b>"Research"</b> & development"#,
        )]))
        .unwrap();
        let out = matcher.apply("Our R&D team");
        assert_eq!(
            out,
            concat!(
                r#"Our <span class="glossary-term" "#,
                r#"title="&quot;Research&quot; &amp; development">R&amp;D</span> team"#
            )
        );
    }

    #[test]
    fn custom_class_name_is_used_and_recognised() {
        let options = AnnotateOptions {
            class_name: "term".to_string(),
        };
        let glossary = table(&[("cat", "Animal")]);
        let once = annotate_with("a cat", &glossary, &options);
        assert_eq!(once, r#"a <span class="term" title="Animal">cat</span>"#);
        assert_eq!(annotate_with(&once, &glossary, &options), once);
    }

    #[test]
    fn spans_are_sorted_and_disjoint() {
        let matcher = TermMatcher::compile(&table(&[
            ("a b", "x"),
            ("b c", "y"),
            ("c", "z"),
        ]))
        .unwrap();
        let spans = matcher.find_spans("a b c b c");
        assert_eq!(matched(&spans), ["a b", "c", "b c"]);
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn segment_classifies_regions() {
        let regions = segment("a<b>c</b>&amp;d", DEFAULT_CLASS_NAME);
        let kinds: Vec<_> = regions.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [
                RegionKind::Text,
                RegionKind::Markup,
                RegionKind::Text,
                RegionKind::Markup,
                RegionKind::Reference { wordlike: false },
                RegionKind::Text,
            ]
        );
    }

    #[test]
    fn parse_tag_handles_quotes_and_comments() {
        let content = r#"<a title="x > y">"#;
        let tag = parse_tag(content, 0).unwrap();
        assert_eq!(tag.end, content.len());

        let comment = "<!-- <b> -->rest";
        assert_eq!(parse_tag(comment, 0).unwrap().end, 12);

        assert!(parse_tag("< b>", 0).is_none());
        assert!(parse_tag("<b", 0).is_none());
    }

    #[test]
    fn wordlike_references() {
        assert!(reference_is_wordlike("&eacute;"));
        assert!(reference_is_wordlike("&#233;"));
        assert!(reference_is_wordlike("&#xE9;"));
        assert!(!reference_is_wordlike("&amp;"));
        assert!(!reference_is_wordlike("&#32;"));
    }
}
