//! Book session and chapter navigation
//!
//! A [`BookSession`] is the reading state for one uploaded book. The
//! navigation operations take it explicitly and only ever move
//! `current_index` within `[0, len - 1]`; a failed operation leaves the
//! session untouched.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::epub::{normalize_href, ContentSource, SpineEntry};

use super::error::ReaderError;

/// Table of contents entry resolved to a spine position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
    /// Position in the spine
    pub index: usize,
    /// Nesting level in the original table of contents
    pub depth: usize,
}

/// Reading state for one loaded book
#[derive(Clone)]
pub struct BookSession {
    title: String,
    file_name: String,
    /// Size of the uploaded archive
    size_bytes: usize,
    spine: Vec<SpineEntry>,
    toc: Vec<TocEntry>,
    current_index: usize,
    toc_visible: bool,
    content: Arc<dyn ContentSource>,
}

impl fmt::Debug for BookSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookSession")
            .field("title", &self.title)
            .field("file_name", &self.file_name)
            .field("size_bytes", &self.size_bytes)
            .field("chapters", &self.spine.len())
            .field("toc_entries", &self.toc.len())
            .field("current_index", &self.current_index)
            .field("toc_visible", &self.toc_visible)
            .finish_non_exhaustive()
    }
}

impl BookSession {
    /// Create a session at the first chapter. `spine` must not be empty.
    pub fn new(
        title: String,
        file_name: String,
        size_bytes: usize,
        spine: Vec<SpineEntry>,
        toc: Vec<TocEntry>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        debug_assert!(!spine.is_empty(), "book session needs at least one chapter");
        Self {
            title,
            file_name,
            size_bytes,
            spine,
            toc,
            current_index: 0,
            toc_visible: false,
            content,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn spine(&self) -> &[SpineEntry] {
        &self.spine
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Number of chapters
    pub fn len(&self) -> usize {
        self.spine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spine.is_empty()
    }

    pub fn toc_visible(&self) -> bool {
        self.toc_visible
    }

    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.spine.len()
    }

    pub fn current_chapter(&self) -> &SpineEntry {
        &self.spine[self.current_index]
    }

    pub fn content(&self) -> &Arc<dyn ContentSource> {
        &self.content
    }

    /// Move to the following chapter
    pub fn next(&mut self) -> Result<usize, ReaderError> {
        if self.is_last() {
            return Err(ReaderError::AtEnd);
        }
        self.current_index += 1;
        Ok(self.current_index)
    }

    /// Move to the preceding chapter
    pub fn previous(&mut self) -> Result<usize, ReaderError> {
        if self.is_first() {
            return Err(ReaderError::AtStart);
        }
        self.current_index -= 1;
        Ok(self.current_index)
    }

    /// Jump to a table of contents entry, matched by title or href.
    ///
    /// Hrefs that name a spine document directly (in-book links) resolve too.
    pub fn jump_to(&mut self, target: &str) -> Result<usize, ReaderError> {
        let index = self
            .resolve_target(target)
            .ok_or_else(|| ReaderError::TargetNotFound(target.to_string()))?;
        self.current_index = index;
        Ok(index)
    }

    /// Position directly on a spine index
    pub fn seek(&mut self, index: usize) -> Result<usize, ReaderError> {
        if index >= self.spine.len() {
            return Err(ReaderError::InvalidIndex {
                index: index.to_string(),
                len: self.spine.len(),
            });
        }
        self.current_index = index;
        Ok(index)
    }

    /// Flip whether the table of contents is expanded
    pub fn toggle_toc(&mut self) -> bool {
        self.toc_visible = !self.toc_visible;
        self.toc_visible
    }

    fn resolve_target(&self, target: &str) -> Option<usize> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }

        if let Some(entry) = self.toc.iter().find(|e| e.title == target) {
            return Some(entry.index);
        }

        if let Some(entry) = self.toc.iter().find(|e| e.href == target) {
            return Some(entry.index);
        }

        let path = normalize_href(target);
        if path.is_empty() {
            return None;
        }

        self.toc
            .iter()
            .find(|e| normalize_href(&e.href) == path)
            .map(|e| e.index)
            .or_else(|| {
                self.spine
                    .iter()
                    .position(|s| s.id == target || normalize_href(&s.href) == path)
            })
    }
}
