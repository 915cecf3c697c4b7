//! HTML processing module
//!
//! Provides HTML handling for the reader:
//! - Chapter sanitization and URL rewriting (lol_html)
//! - Page templates

mod chapter;
mod pages;

pub use chapter::{jump_url, prepare_chapter, resource_url, RewriteError, JUMP_PATH, RESOURCE_PREFIX};
pub use pages::{error_page, index_page, reader_page, ReaderView};
