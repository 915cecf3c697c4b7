//! In-memory book used by unit tests in place of a real EPUB

use std::sync::Arc;

use crate::epub::{BookParser, ContentSource, ParseError, ParsedBook, Resource, SpineEntry, TocNode};

use super::ingest::{ingest, Upload};
use super::navigator::BookSession;

pub(crate) const PIXEL_PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Builder for a fake book with `c{n}.xhtml` chapters
#[derive(Clone)]
pub(crate) struct FakeBook {
    title: Option<String>,
    chapters: usize,
    toc: Vec<TocNode>,
    broken: bool,
}

impl FakeBook {
    pub(crate) fn chapters(count: usize) -> Self {
        Self {
            title: Some("Fake Book".to_string()),
            chapters: count,
            toc: Vec::new(),
            broken: false,
        }
    }

    pub(crate) fn untitled(mut self) -> Self {
        self.title = None;
        self
    }

    pub(crate) fn with_toc_entry(mut self, label: &str, href: &str) -> Self {
        self.toc.push(TocNode::new(label, href));
        self
    }

    /// Chapters fail to read after parsing succeeded
    pub(crate) fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    fn build(&self) -> ParsedBook {
        ParsedBook {
            title: self.title.clone(),
            spine: (0..self.chapters)
                .map(|i| SpineEntry::new(format!("c{}", i), format!("c{}.xhtml", i)))
                .collect(),
            toc: self.toc.clone(),
            content: Arc::new(FakeContent {
                broken: self.broken,
            }),
        }
    }
}

struct FakeContent {
    broken: bool,
}

impl ContentSource for FakeContent {
    fn chapter_html(&self, chapter: &SpineEntry) -> Result<String, ParseError> {
        if self.broken {
            return Err(ParseError::ContentError("archive truncated".to_string()));
        }
        Ok(format!(
            "<html><body><h1>Chapter {id}</h1>\
             <img src=\"images/pic.png\"><script>alert(1)</script>\
             <a href=\"c0.xhtml#top\">back</a></body></html>",
            id = chapter.id
        ))
    }

    fn resource(&self, href: &str) -> Result<Resource, ParseError> {
        if href == "images/pic.png" {
            Ok(Resource {
                href: href.to_string(),
                media_type: "image/png".to_string(),
                data: PIXEL_PNG.to_vec(),
            })
        } else {
            Err(ParseError::ResourceNotFound(href.to_string()))
        }
    }
}

/// Parser returning a prepared fake book, or failing every time
pub(crate) struct FakeParser {
    book: Option<FakeBook>,
}

impl FakeParser {
    pub(crate) fn new(book: FakeBook) -> Self {
        Self { book: Some(book) }
    }

    pub(crate) fn failing() -> Self {
        Self { book: None }
    }
}

impl BookParser for FakeParser {
    fn parse(&self, _data: Vec<u8>) -> Result<ParsedBook, ParseError> {
        self.book
            .as_ref()
            .map(FakeBook::build)
            .ok_or_else(|| ParseError::OpenError("invalid Zip archive".to_string()))
    }
}

pub(crate) fn book_session(book: FakeBook) -> BookSession {
    book_session_of_size(book, 0)
}

/// Session whose upload was `size` bytes long
pub(crate) fn book_session_of_size(book: FakeBook, size: usize) -> BookSession {
    match ingest(&FakeParser::new(book), Upload::new("fake.epub", vec![0; size])) {
        Ok(session) => session,
        Err(e) => panic!("fake book failed to ingest: {}", e),
    }
}
