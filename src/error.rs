//! Error types for the Lector server

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::html::{error_page, RewriteError};
use crate::reader::ReaderError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Chapter rewrite error: {0}")]
    Rewrite(#[from] RewriteError),
}

/// Redirect to `path` with a message for the reader
pub fn redirect_with_notice(path: &str, notice: &str) -> Redirect {
    Redirect::to(&format!("{}?notice={}", path, urlencoding::encode(notice)))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Reader(err) => {
                let target = match &err {
                    ReaderError::InvalidIndex { .. } => "/read/0",
                    ReaderError::TargetNotFound(_)
                    | ReaderError::AtStart
                    | ReaderError::AtEnd => "/read",
                    _ => "/",
                };
                tracing::debug!(error = %err, redirect = target, "Reader error");
                redirect_with_notice(target, &err.notice()).into_response()
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                redirect_with_notice("/", &msg).into_response()
            }
            AppError::ResourceNotFound(href) => (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Resource not found: {}", href),
            )
                .into_response(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_error_response()
            }
            AppError::Rewrite(e) => {
                tracing::error!("Chapter rewrite error: {}", e);
                internal_error_response()
            }
        }
    }
}

fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(error_page("An internal error occurred")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[test]
    fn test_missing_session_redirects_to_upload() {
        let response = AppError::from(ReaderError::SessionExpiredOrMissing).into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/?notice=No%20book%20loaded"));
    }

    #[test]
    fn test_invalid_index_redirects_to_first_chapter() {
        let response =
            AppError::from(ReaderError::InvalidIndex {
            index: "9".to_string(),
            len: 2,
        })
        .into_response();

        assert_eq!(location(&response), "/read/0?notice=Invalid%20chapter%20index.");
    }

    #[test]
    fn test_unknown_target_stays_on_current_chapter() {
        let response =
            AppError::from(ReaderError::TargetNotFound("Nope".to_string())).into_response();
        assert!(location(&response).starts_with("/read?notice="));
    }

    #[test]
    fn test_resource_not_found_is_404() {
        let response = AppError::ResourceNotFound("a.png".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_is_500() {
        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
