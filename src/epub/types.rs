//! EPUB data types
//!
//! Core types for representing a parsed EPUB and its content.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::parser::ContentSource;

/// A content document in reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpineEntry {
    /// Manifest id, used as the chapter identifier
    pub id: String,
    /// Path of the document inside the archive
    pub href: String,
}

impl SpineEntry {
    pub fn new(id: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
        }
    }
}

/// Table of contents node as reported by the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocNode {
    /// Display label
    pub label: String,
    /// Reference to content, possibly with a fragment
    pub href: String,
    /// Nested children
    pub children: Vec<TocNode>,
}

impl TocNode {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TocNode>) -> Self {
        self.children = children;
        self
    }
}

/// Resource content (images, CSS, fonts)
#[derive(Debug, Clone)]
pub struct Resource {
    /// Resource href
    pub href: String,
    /// MIME type
    pub media_type: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

/// A parsed book ready to be read
#[derive(Clone)]
pub struct ParsedBook {
    /// Title from the package metadata, if any
    pub title: Option<String>,
    /// Content documents in reading order
    pub spine: Vec<SpineEntry>,
    /// Raw table of contents
    pub toc: Vec<TocNode>,
    /// Handle used to read chapters and resources later
    pub content: Arc<dyn ContentSource>,
}

impl fmt::Debug for ParsedBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedBook")
            .field("title", &self.title)
            .field("spine", &self.spine)
            .field("toc", &self.toc)
            .finish_non_exhaustive()
    }
}

/// Strip a leading slash and any fragment so hrefs from the spine, the
/// table of contents and chapter links compare equal.
pub fn normalize_href(href: &str) -> &str {
    let path = href.split('#').next().unwrap_or(href);
    path.trim_start_matches('/')
}

/// Directory part of an archive path, without a trailing slash.
pub fn parent_dir(href: &str) -> &str {
    let path = normalize_href(href);
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Resolve `relative` against the directory `base_dir` inside the archive,
/// collapsing `.` and `..` segments. Fragments and query strings are kept.
pub fn resolve_href(base_dir: &str, relative: &str) -> String {
    let (path, suffix) = match relative.find(['#', '?']) {
        Some(pos) => relative.split_at(pos),
        None => (relative, ""),
    };

    let mut segments: Vec<&str> = if path.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("{}{}", segments.join("/"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_href() {
        assert_eq!(normalize_href("/OEBPS/ch1.xhtml#sec2"), "OEBPS/ch1.xhtml");
        assert_eq!(normalize_href("ch1.xhtml"), "ch1.xhtml");
        assert_eq!(normalize_href("#only"), "");
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("OEBPS/text/ch1.xhtml"), "OEBPS/text");
        assert_eq!(parent_dir("/ch1.xhtml"), "");
    }

    #[test]
    fn test_resolve_href_with_parent_segments() {
        assert_eq!(
            resolve_href("OEBPS/text", "../images/cover.jpg"),
            "OEBPS/images/cover.jpg"
        );
        assert_eq!(resolve_href("OEBPS", "./style.css"), "OEBPS/style.css");
        assert_eq!(resolve_href("", "ch2.xhtml#note"), "ch2.xhtml#note");
    }

    #[test]
    fn test_resolve_href_cannot_escape_root() {
        assert_eq!(resolve_href("OEBPS", "../../../etc/passwd"), "etc/passwd");
    }

    #[test]
    fn test_resolve_absolute_archive_path() {
        assert_eq!(resolve_href("OEBPS/text", "/OEBPS/a.png"), "OEBPS/a.png");
    }
}
