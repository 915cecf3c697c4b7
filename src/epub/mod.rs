//! EPUB parsing module
//!
//! Wraps the rbook crate behind the [`BookParser`] and [`ContentSource`]
//! capabilities, plus the href helpers shared by ingest and rendering.

mod parser;
mod types;

pub use parser::{BookParser, ContentSource, ParseError, RbookParser};
pub use types::{
    normalize_href, parent_dir, resolve_href, ParsedBook, Resource, SpineEntry, TocNode,
};
