//! Per-browser reading sessions
//!
//! The browser only holds an opaque id in a cookie; the book and reading
//! position stay server-side in the [`SessionStore`].

pub mod cookie;
mod store;

pub use store::{ReaderSession, SessionStore};
