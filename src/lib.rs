//! Lector Server Library
//!
//! Upload an EPUB and read it chapter by chapter in the browser.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `epub`: EPUB parsing behind the `BookParser`/`ContentSource` capabilities
//! - `reader`: Upload ingest and chapter navigation
//! - `session`: Cookie-bound reading sessions
//! - `html`: Chapter rewriting and page templates
//! - `routes`: HTTP endpoints

pub mod config;
pub mod epub;
pub mod error;
pub mod html;
pub mod reader;
pub mod routes;
pub mod session;
pub mod state;

pub use config::Config;
pub use state::AppState;
