//! # Glosstip
//!
//! Annotate page content with tooltips drawn from one or more remote
//! glossaries.
//!
//! ## Features
//!
//! - **Aggregation**: merges glossary payloads from several sources, first source wins on duplicate terms
//! - **Annotation**: wraps whole-word, case-insensitive term matches in a tooltip `<span>` without touching markup
//! - **Listing**: renders the merged glossary as a definition list
//! - **Caching**: keeps the last good payload of every source in sled

pub mod aggregator;
pub mod annotator;
pub mod cache;
pub mod config;
pub mod entry;
pub mod markup;
pub mod render;
pub mod source;

pub use aggregator::{merge, GlossaryTable, SourcePayload};
pub use annotator::{annotate, annotate_with, AnnotateOptions, AnnotationSpan, TermMatcher};
pub use cache::PayloadCache;
pub use config::Config;
pub use entry::GlossaryEntry;
pub use markup::EscapedText;
