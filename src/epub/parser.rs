//! EPUB parser using rbook
//!
//! Parsing and chapter reads are exposed as two small capabilities so the
//! reader logic can run against any implementation:
//!
//! - [`BookParser`] turns uploaded bytes into a [`ParsedBook`]
//! - [`ContentSource`] reads chapter markup and resources from an opened book
//!
//! [`RbookParser`] is the production implementation, wrapping the rbook crate.

use std::io::Cursor;
use std::sync::Arc;

use rbook::prelude::*;
use rbook::Epub;
use thiserror::Error;

use super::types::{normalize_href, ParsedBook, Resource, SpineEntry, TocNode};

/// Media types treated as readable content documents
const DOCUMENT_MEDIA_TYPES: &[&str] = &["application/xhtml+xml", "text/html"];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to open EPUB: {0}")]
    OpenError(String),
    #[error("Failed to read content: {0}")]
    ContentError(String),
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}

/// Turns raw upload bytes into a parsed book
pub trait BookParser: Send + Sync {
    fn parse(&self, data: Vec<u8>) -> Result<ParsedBook, ParseError>;
}

/// Reads content out of an opened book
pub trait ContentSource: Send + Sync {
    /// Raw markup of a spine document
    fn chapter_html(&self, chapter: &SpineEntry) -> Result<String, ParseError>;

    /// Image, stylesheet or font by archive path
    fn resource(&self, href: &str) -> Result<Resource, ParseError>;
}

/// Production parser backed by rbook
#[derive(Debug, Clone, Copy, Default)]
pub struct RbookParser;

impl RbookParser {
    pub fn new() -> Self {
        Self
    }
}

impl BookParser for RbookParser {
    fn parse(&self, data: Vec<u8>) -> Result<ParsedBook, ParseError> {
        // Use lenient parsing to handle EPUBs with missing metadata
        let epub = Epub::options()
            .strict(false)
            .read(Cursor::new(data))
            .map_err(|e| ParseError::OpenError(e.to_string()))?;

        let book = RbookContent { epub };
        let title = book.extract_title();
        let spine = book.extract_spine();
        let toc = book.extract_toc();

        tracing::debug!(
            title = ?title,
            spine = spine.len(),
            toc = toc.len(),
            "Parsed EPUB"
        );

        Ok(ParsedBook {
            title,
            spine,
            toc,
            content: Arc::new(book),
        })
    }
}

/// An opened rbook EPUB
struct RbookContent {
    epub: Epub,
}

impl RbookContent {
    fn extract_title(&self) -> Option<String> {
        self.epub
            .metadata()
            .title()
            .map(|t| t.value().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Spine entries whose manifest item is an (X)HTML document
    fn extract_spine(&self) -> Vec<SpineEntry> {
        let manifest = self.epub.manifest();

        self.epub
            .spine()
            .entries()
            .filter_map(|item| {
                let idref = item.idref().to_string();
                let manifest_item = manifest.by_id(&idref)?;
                let media_type = manifest_item.media_type().to_string();
                if !DOCUMENT_MEDIA_TYPES.contains(&media_type.as_str()) {
                    tracing::debug!(idref = %idref, media_type = %media_type, "Skipping non-document spine item");
                    return None;
                }
                Some(SpineEntry::new(idref, manifest_item.href().to_string()))
            })
            .collect()
    }

    fn extract_toc(&self) -> Vec<TocNode> {
        let toc = self.epub.toc();

        let Some(root) = toc.contents() else {
            return Vec::new();
        };

        fn convert_entry<'a>(entry: impl rbook::prelude::TocEntry<'a>) -> TocNode {
            let href = entry
                .resource()
                .map(|r| {
                    use rbook::ebook::resource::ResourceKey;
                    match r.key() {
                        ResourceKey::Value(s) => s.to_string(),
                        ResourceKey::Position(pos) => pos.to_string(),
                    }
                })
                .unwrap_or_default();

            TocNode {
                label: entry.label().to_string(),
                href,
                children: entry.children().iter().map(convert_entry).collect(),
            }
        }

        root.children().iter().map(convert_entry).collect()
    }
}

impl ContentSource for RbookContent {
    fn chapter_html(&self, chapter: &SpineEntry) -> Result<String, ParseError> {
        let manifest = self.epub.manifest();
        let manifest_item = manifest.by_id(&chapter.id).ok_or_else(|| {
            ParseError::ContentError(format!("Manifest item {} not found", chapter.id))
        })?;

        self.epub
            .read_resource_str(manifest_item.href())
            .map_err(|e| ParseError::ContentError(e.to_string()))
    }

    fn resource(&self, href: &str) -> Result<Resource, ParseError> {
        let manifest = self.epub.manifest();

        // rbook may report hrefs with or without the leading slash
        let normalized = normalize_href(href);
        let rooted = format!("/{}", normalized);
        let manifest_item = manifest
            .by_href(href)
            .or_else(|| manifest.by_href(normalized))
            .or_else(|| manifest.by_href(&rooted))
            .ok_or_else(|| ParseError::ResourceNotFound(href.to_string()))?;

        let data = self
            .epub
            .read_resource_bytes(manifest_item.href())
            .map_err(|e| ParseError::ContentError(e.to_string()))?;

        Ok(Resource {
            href: href.to_string(),
            media_type: manifest_item.media_type().to_string(),
            data,
        })
    }
}
