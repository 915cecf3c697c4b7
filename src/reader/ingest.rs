//! Upload ingest
//!
//! Validates an uploaded file, hands it to the injected [`BookParser`] and
//! builds the initial [`BookSession`].

use std::collections::HashMap;
use std::collections::HashSet;

use crate::epub::{normalize_href, BookParser, SpineEntry, TocNode};

use super::error::ReaderError;
use super::navigator::{BookSession, TocEntry};

/// File extensions accepted for upload
pub const ALLOWED_EXTENSIONS: &[&str] = &["epub"];

/// Label used for table of contents entries without one
pub const UNTITLED_ENTRY: &str = "(No Title)";

/// An uploaded file as received from the form
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }
}

/// Check the file name carries an allowed extension
pub fn allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Parse an upload into a fresh reading session positioned at chapter 0
pub fn ingest(parser: &dyn BookParser, upload: Upload) -> Result<BookSession, ReaderError> {
    let file_name = upload.file_name.trim().to_string();
    if file_name.is_empty() {
        return Err(ReaderError::NoFileSelected);
    }
    if !allowed_file(&file_name) {
        return Err(ReaderError::InvalidFileType(file_name));
    }

    let size = upload.data.len();
    let book = parser.parse(upload.data).map_err(|e| {
        tracing::warn!(file_name = %file_name, error = %e, "Rejected upload");
        ReaderError::UnsupportedFormat(e.to_string())
    })?;

    if book.spine.is_empty() {
        tracing::warn!(file_name = %file_name, "EPUB has an empty spine");
        return Err(ReaderError::EmptyDocument);
    }

    let toc = resolve_toc(&book.toc, &book.spine);
    let title = book
        .title
        .unwrap_or_else(|| file_stem(&file_name).to_string());

    tracing::info!(
        file_name = %file_name,
        title = %title,
        size = size,
        spine = book.spine.len(),
        toc = toc.len(),
        "Book ingested"
    );

    Ok(BookSession::new(
        title,
        file_name,
        size,
        book.spine,
        toc,
        book.content,
    ))
}

/// Flatten the table of contents and map each entry onto a spine index.
///
/// Entries pointing outside the spine are dropped and only the first entry
/// per spine index is kept.
pub fn resolve_toc(nodes: &[TocNode], spine: &[SpineEntry]) -> Vec<TocEntry> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (index, entry) in spine.iter().enumerate() {
        positions.entry(normalize_href(&entry.href)).or_insert(index);
    }

    fn walk(
        nodes: &[TocNode],
        depth: usize,
        positions: &HashMap<&str, usize>,
        out: &mut Vec<TocEntry>,
    ) {
        for node in nodes {
            if let Some(index) = spine_position(positions, &node.href) {
                let title = node.label.trim();
                out.push(TocEntry {
                    title: if title.is_empty() {
                        UNTITLED_ENTRY.to_string()
                    } else {
                        title.to_string()
                    },
                    href: node.href.clone(),
                    index,
                    depth,
                });
            }
            walk(&node.children, depth + 1, positions, out);
        }
    }

    let mut flattened = Vec::new();
    walk(nodes, 0, &positions, &mut flattened);

    let mut seen = HashSet::new();
    flattened.retain(|entry| seen.insert(entry.index));
    flattened
}

/// Spine index for a table of contents href. Hrefs relative to the
/// navigation document match spine paths by suffix.
fn spine_position(positions: &HashMap<&str, usize>, href: &str) -> Option<usize> {
    let path = normalize_href(href);
    if path.is_empty() {
        return None;
    }

    positions.get(path).copied().or_else(|| {
        let suffix = format!("/{}", path);
        positions
            .iter()
            .filter(|(spine_path, _)| spine_path.ends_with(&suffix))
            .map(|(_, &index)| index)
            .min()
    })
}

fn file_stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}
