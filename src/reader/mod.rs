//! Reading session logic
//!
//! - `ingest`: upload validation and book loading
//! - `navigator`: the per-book reading state and its transitions
//! - `error`: the reader error taxonomy

mod error;
mod ingest;
mod navigator;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ReaderError;
pub use ingest::{allowed_file, ingest, resolve_toc, Upload, ALLOWED_EXTENSIONS, UNTITLED_ENTRY};
pub use navigator::{BookSession, TocEntry};
