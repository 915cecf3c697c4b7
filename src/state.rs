//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::epub::BookParser;
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    sessions: SessionStore,
    parser: Arc<dyn BookParser>,
}

impl AppState {
    /// Create a new application state around the given EPUB parser
    pub fn new(config: Config, parser: Arc<dyn BookParser>) -> Self {
        let sessions = SessionStore::new(&config.session);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                sessions,
                parser,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the reader session store
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Get the EPUB parser
    pub fn parser(&self) -> &dyn BookParser {
        self.inner.parser.as_ref()
    }

    /// Name of the session cookie
    pub fn cookie_name(&self) -> &str {
        &self.inner.config.session.cookie_name
    }
}
