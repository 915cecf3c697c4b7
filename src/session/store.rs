//! Reader session store
//!
//! Keeps one [`BookSession`] per browser session with:
//! - In-memory storage behind a read/write lock
//! - Sliding expiry refreshed on every access
//! - Caps on live sessions and on the bytes of loaded books, evicting the
//!   least recently used
//! - Periodic cleanup of expired sessions

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::reader::{BookSession, ReaderError};

/// A stored reading session
#[derive(Debug, Clone)]
pub struct ReaderSession {
    pub id: Uuid,
    pub book: BookSession,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ReaderSession {
    fn new(book: BookSession, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            book,
            created_at: now,
            last_accessed: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    fn touch(&mut self, ttl: chrono::Duration) {
        let now = Utc::now();
        self.last_accessed = now;
        self.expires_at = now + ttl;
    }
}

/// Shared handle to all reader sessions
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    sessions: RwLock<HashMap<Uuid, ReaderSession>>,
    ttl: chrono::Duration,
    max_sessions: usize,
    max_total_bytes: usize,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                ttl: config.ttl(),
                max_sessions: config.max_sessions.max(1),
                max_total_bytes: config.max_total_bytes,
            }),
        }
    }

    // ========================================================================
    // Session Lifecycle
    // ========================================================================

    /// Store a freshly ingested book under a new session id
    pub async fn create(&self, book: BookSession) -> ReaderSession {
        let session = ReaderSession::new(book, self.inner.ttl);

        let incoming = session.book.size_bytes();

        let mut sessions = self.inner.sessions.write().await;
        if !self.has_room(&sessions, incoming) {
            sessions.retain(|_, s| !s.is_expired());
        }
        while !self.has_room(&sessions, incoming) {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.last_accessed)
                .map(|s| s.id)
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::info!(session_id = %oldest, "Evicted least recently used session");
        }
        if incoming > self.inner.max_total_bytes {
            tracing::warn!(
                size = incoming,
                max_total_bytes = self.inner.max_total_bytes,
                "Book alone exceeds the session byte budget"
            );
        }
        sessions.insert(session.id, session.clone());

        tracing::info!(
            session_id = %session.id,
            title = %session.book.title(),
            chapters = session.book.len(),
            "Created reader session"
        );

        session
    }

    /// Whether a book of `incoming` bytes fits without evicting anything
    fn has_room(&self, sessions: &HashMap<Uuid, ReaderSession>, incoming: usize) -> bool {
        if sessions.is_empty() {
            return true;
        }
        let used: usize = sessions.values().map(|s| s.book.size_bytes()).sum();
        sessions.len() < self.inner.max_sessions
            && used.saturating_add(incoming) <= self.inner.max_total_bytes
    }

    /// Get a copy of the book for a session, refreshing its expiry
    pub async fn get(&self, id: Uuid) -> Result<BookSession, ReaderError> {
        self.modify(id, |book| Ok(book.clone())).await
    }

    /// Run `f` against the stored book. The book is only changed if `f`
    /// changes it; errors from `f` are passed through.
    pub async fn modify<T, F>(&self, id: Uuid, f: F) -> Result<T, ReaderError>
    where
        F: FnOnce(&mut BookSession) -> Result<T, ReaderError>,
    {
        let mut sessions = self.inner.sessions.write().await;

        let expired = match sessions.get(&id) {
            Some(session) => session.is_expired(),
            None => return Err(ReaderError::SessionExpiredOrMissing),
        };
        if expired {
            sessions.remove(&id);
            tracing::debug!(session_id = %id, "Session expired");
            return Err(ReaderError::SessionExpiredOrMissing);
        }

        let session = sessions
            .get_mut(&id)
            .ok_or(ReaderError::SessionExpiredOrMissing)?;
        session.touch(self.inner.ttl);
        f(&mut session.book)
    }

    /// Drop a session and the book it holds
    pub async fn remove(&self, id: Uuid) -> Option<ReaderSession> {
        let removed = self.inner.sessions.write().await.remove(&id);
        if let Some(session) = &removed {
            tracing::info!(
                session_id = %id,
                title = %session.book.title(),
                "Reader session closed"
            );
        }
        removed
    }

    /// Get session count
    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.sessions.read().await.is_empty()
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Remove expired sessions, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.inner.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        let count = before - sessions.len();

        if count > 0 {
            tracing::info!(count = count, "Cleaned up expired reader sessions");
        }

        count
    }

    /// Start background cleanup task
    pub fn start_cleanup_task(self, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;
                self.cleanup_expired().await;
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::testing::{book_session, book_session_of_size, FakeBook};

    fn store_with(ttl_minutes: i64, max_sessions: usize) -> SessionStore {
        SessionStore::new(&SessionConfig {
            ttl_minutes,
            max_sessions,
            ..SessionConfig::default()
        })
    }

    async fn expires_at(store: &SessionStore, id: Uuid) -> DateTime<Utc> {
        store.inner.sessions.read().await[&id].expires_at
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store_with(60, 10);
        let session = store.create(book_session(FakeBook::chapters(3))).await;

        let book = store.get(session.id).await.unwrap();
        assert_eq!(book.len(), 3);
        assert_eq!(book.current_index(), 0);
    }

    #[tokio::test]
    async fn test_modify_persists_navigation() {
        let store = store_with(60, 10);
        let session = store.create(book_session(FakeBook::chapters(3))).await;

        let index = store.modify(session.id, |book| book.next()).await.unwrap();
        assert_eq!(index, 1);
        assert_eq!(store.get(session.id).await.unwrap().current_index(), 1);
    }

    #[tokio::test]
    async fn test_failed_modify_leaves_state() {
        let store = store_with(60, 10);
        let session = store.create(book_session(FakeBook::chapters(2))).await;

        let result = store.modify(session.id, |book| book.previous()).await;
        assert_eq!(result, Err(ReaderError::AtStart));
        assert_eq!(store.get(session.id).await.unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = store_with(60, 10);
        let result = store.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ReaderError::SessionExpiredOrMissing)));
    }

    #[tokio::test]
    async fn test_expired_session_is_missing() {
        let store = store_with(0, 10);
        let session = store.create(book_session(FakeBook::chapters(1))).await;

        let result = store.get(session.id).await;
        assert!(matches!(result, Err(ReaderError::SessionExpiredOrMissing)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = store_with(0, 10);
        store.create(book_session(FakeBook::chapters(1))).await;
        store.create(book_session(FakeBook::chapters(1))).await;

        assert_eq!(store.cleanup_expired().await, 2);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let store = store_with(60, 2);
        let first = store.create(book_session(FakeBook::chapters(1))).await;
        let second = store.create(book_session(FakeBook::chapters(1))).await;

        // Touch the first so the second becomes the oldest
        store.get(first.id).await.unwrap();
        let third = store.create(book_session(FakeBook::chapters(1))).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(first.id).await.is_ok());
        assert!(store.get(second.id).await.is_err());
        assert!(store.get(third.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_access_slides_expiry() {
        let store = store_with(60, 10);
        let session = store.create(book_session(FakeBook::chapters(2))).await;
        let created = expires_at(&store, session.id).await;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.get(session.id).await.unwrap();
        let after_get = expires_at(&store, session.id).await;
        assert!(after_get > created);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.modify(session.id, |book| book.next()).await.unwrap();
        assert!(expires_at(&store, session.id).await > after_get);
    }

    #[tokio::test]
    async fn test_byte_budget_evicts_least_recently_used() {
        let store = SessionStore::new(&SessionConfig {
            max_total_bytes: 100,
            ..SessionConfig::default()
        });
        let first = store
            .create(book_session_of_size(FakeBook::chapters(1), 40))
            .await;
        let second = store
            .create(book_session_of_size(FakeBook::chapters(1), 40))
            .await;
        store.get(first.id).await.unwrap();

        let third = store
            .create(book_session_of_size(FakeBook::chapters(1), 40))
            .await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(first.id).await.is_ok());
        assert!(store.get(second.id).await.is_err());
        assert!(store.get(third.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_oversized_book_still_opens() {
        let store = SessionStore::new(&SessionConfig {
            max_total_bytes: 10,
            ..SessionConfig::default()
        });
        store
            .create(book_session_of_size(FakeBook::chapters(1), 5))
            .await;
        let big = store
            .create(book_session_of_size(FakeBook::chapters(1), 50))
            .await;

        assert_eq!(store.len().await, 1);
        assert!(store.get(big.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store_with(60, 10);
        let session = store.create(book_session(FakeBook::chapters(1))).await;

        assert!(store.remove(session.id).await.is_some());
        assert!(store.remove(session.id).await.is_none());
        assert!(store.get(session.id).await.is_err());
    }
}
