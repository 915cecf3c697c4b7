//! Reader routes
//!
//! Upload, chapter display and navigation:
//! - GET  /              - Upload form; drops any loaded book
//! - POST /upload        - Load an EPUB into a new session
//! - GET  /read          - Current chapter
//! - GET  /read/:index   - Chapter by spine index
//! - GET  /next          - Following chapter
//! - GET  /previous      - Preceding chapter
//! - GET  /jump?target=  - Table of contents entry or in-book link
//! - GET  /toc           - Expand/collapse the table of contents
//! - GET  /exit          - Close the book and forget the session

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::html::{index_page, prepare_chapter, reader_page, ReaderView};
use crate::reader::{ingest, BookSession, ReaderError, Upload};
use crate::session::cookie;
use crate::state::AppState;

/// Optional message carried across a redirect
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JumpQuery {
    pub target: Option<String>,
}

/// Create the reader router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/read", get(read_current))
        .route("/read/:index", get(read_item))
        .route("/next", get(next))
        .route("/previous", get(previous))
        .route("/jump", get(jump))
        .route("/toc", get(toggle_toc))
        .route("/exit", get(exit))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
///
/// Returning to the upload screen closes the current book.
async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    if let Some(id) = cookie::session_id(&headers, state.cookie_name()) {
        state.sessions().remove(id).await;
    }
    Html(index_page(query.notice.as_deref()))
}

/// POST /upload
async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read file data: {}", e);
            AppError::BadRequest(format!("Failed to read upload: {}", e))
        })?;

        tracing::debug!(file_name = %file_name, size = data.len(), "Received upload");
        upload = Some(Upload::new(file_name, data.to_vec()));
        break;
    }

    let upload = upload.ok_or(ReaderError::NoFileSelected)?;

    // A new upload replaces whatever book the browser had open
    if let Some(old) = cookie::session_id(&headers, state.cookie_name()) {
        state.sessions().remove(old).await;
    }

    let book = ingest(state.parser(), upload)?;
    let session = state.sessions().create(book).await;
    let max_age = state.config().session.ttl().num_seconds();

    Ok((
        [(
            header::SET_COOKIE,
            cookie::set_session(state.cookie_name(), session.id, max_age),
        )],
        Redirect::to("/read/0"),
    )
        .into_response())
}

/// GET /read
async fn read_current(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>> {
    let id = require_session(&state, &headers)?;
    let book = state.sessions().get(id).await?;
    render_chapter(&state, id, &book, query.notice.as_deref()).await
}

/// GET /read/:index
async fn read_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_index): Path<String>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>> {
    let id = require_session(&state, &headers)?;
    let book = state
        .sessions()
        .modify(id, |book| {
            match raw_index.parse::<usize>() {
                Ok(index) => book.seek(index)?,
                Err(_) => {
                    return Err(ReaderError::InvalidIndex {
                        index: raw_index.clone(),
                        len: book.len(),
                    })
                }
            };
            Ok(book.clone())
        })
        .await?;
    render_chapter(&state, id, &book, query.notice.as_deref()).await
}

/// GET /next
async fn next(State(state): State<AppState>, headers: HeaderMap) -> Result<Redirect> {
    step(&state, &headers, BookSession::next).await
}

/// GET /previous
async fn previous(State(state): State<AppState>, headers: HeaderMap) -> Result<Redirect> {
    step(&state, &headers, BookSession::previous).await
}

/// GET /jump?target=
async fn jump(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<JumpQuery>,
) -> Result<Redirect> {
    let id = require_session(&state, &headers)?;
    let target = query.target.unwrap_or_default();
    let index = state
        .sessions()
        .modify(id, |book| book.jump_to(&target))
        .await?;

    tracing::debug!(session_id = %id, target = %target, index = index, "Jumped");
    Ok(chapter_redirect(index))
}

/// GET /toc
async fn toggle_toc(State(state): State<AppState>, headers: HeaderMap) -> Result<Redirect> {
    let id = require_session(&state, &headers)?;
    let index = state
        .sessions()
        .modify(id, |book| {
            book.toggle_toc();
            Ok(book.current_index())
        })
        .await?;
    Ok(chapter_redirect(index))
}

/// GET /exit
async fn exit(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = cookie::session_id(&headers, state.cookie_name()) {
        state.sessions().remove(id).await;
    }

    (
        [(header::SET_COOKIE, cookie::clear_session(state.cookie_name()))],
        Redirect::to("/"),
    )
        .into_response()
}

// ============================================================================
// Helpers
// ============================================================================

fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Uuid> {
    cookie::session_id(headers, state.cookie_name())
        .ok_or_else(|| ReaderError::SessionExpiredOrMissing.into())
}

fn chapter_redirect(index: usize) -> Redirect {
    Redirect::to(&format!("/read/{}", index))
}

/// Apply a one-chapter move; at either end the reader stays where they are
async fn step(
    state: &AppState,
    headers: &HeaderMap,
    mv: fn(&mut BookSession) -> std::result::Result<usize, ReaderError>,
) -> Result<Redirect> {
    let id = require_session(state, headers)?;
    let index = state
        .sessions()
        .modify(id, |book| match mv(book) {
            Err(e) if e.is_boundary() => Ok(book.current_index()),
            other => other,
        })
        .await?;
    Ok(chapter_redirect(index))
}

/// Render the current chapter of `book`.
///
/// A chapter that cannot be read closes the book, since the archive is
/// unlikely to recover.
async fn render_chapter(
    state: &AppState,
    id: Uuid,
    book: &BookSession,
    notice: Option<&str>,
) -> Result<Html<String>> {
    let chapter = book.current_chapter();

    let raw = match book.content().chapter_html(chapter) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(
                session_id = %id,
                index = book.current_index(),
                chapter = %chapter.id,
                error = %e,
                "Failed to read chapter"
            );
            state.sessions().remove(id).await;
            return Err(ReaderError::ChapterUnavailable {
                index: book.current_index(),
                reason: e.to_string(),
            }
            .into());
        }
    };

    let content = prepare_chapter(&raw, &chapter.href)?;

    Ok(Html(reader_page(&ReaderView {
        book,
        content: &content,
        notice,
    })))
}

// ============================================================================
// Tests
// ============================================================================
