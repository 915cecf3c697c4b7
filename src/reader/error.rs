//! Reader error types

use thiserror::Error;

/// Everything that can go wrong while loading or navigating a book.
///
/// All variants are recoverable: the HTTP layer turns them into a redirect
/// carrying [`ReaderError::notice`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Could not process EPUB file: {0}")]
    UnsupportedFormat(String),

    #[error("EPUB has no readable content in its spine")]
    EmptyDocument,

    #[error("Table of contents entry not found: {0}")]
    TargetNotFound(String),

    #[error("Invalid chapter index: {index} (book has {len} chapters)")]
    InvalidIndex { index: String, len: usize },

    #[error("Already at the first chapter")]
    AtStart,

    #[error("Already at the last chapter")]
    AtEnd,

    #[error("No book loaded")]
    SessionExpiredOrMissing,

    #[error("Could not read chapter {index}: {reason}")]
    ChapterUnavailable { index: usize, reason: String },
}

impl ReaderError {
    /// Message shown to the reader on the page they are sent back to
    pub fn notice(&self) -> String {
        match self {
            ReaderError::NoFileSelected => "No selected file".to_string(),
            ReaderError::InvalidFileType(_) => {
                "Invalid file type. Please upload an EPUB file.".to_string()
            }
            ReaderError::UnsupportedFormat(reason) => {
                format!("Could not process EPUB file: {}", reason)
            }
            ReaderError::EmptyDocument => "EPUB has no readable content in its spine.".to_string(),
            ReaderError::TargetNotFound(target) => {
                format!("Could not find \"{}\" in this book.", target)
            }
            ReaderError::InvalidIndex { .. } => "Invalid chapter index.".to_string(),
            ReaderError::AtStart => "Already at the first chapter.".to_string(),
            ReaderError::AtEnd => "Already at the last chapter.".to_string(),
            ReaderError::SessionExpiredOrMissing => {
                "No book loaded. Please upload an EPUB file.".to_string()
            }
            ReaderError::ChapterUnavailable { reason, .. } => {
                format!("Error reading book content: {}", reason)
            }
        }
    }

    /// Boundary reports are not failures; navigation just stays put
    pub fn is_boundary(&self) -> bool {
        matches!(self, ReaderError::AtStart | ReaderError::AtEnd)
    }
}
