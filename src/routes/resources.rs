//! Book resource endpoint
//!
//! Serves images, stylesheets and fonts referenced by the current chapter.
//! Responses are sandboxed so book documents opened directly cannot run
//! script on this origin.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::epub::ParseError;
use crate::error::{AppError, Result};
use crate::session::cookie;
use crate::state::AppState;

/// Policy applied to every resource response
const RESOURCE_CSP: &str = "sandbox; default-src 'none'; img-src 'self' data:; style-src 'self' 'unsafe-inline'; font-src 'self'";

/// Create the resources router
pub fn router() -> Router<AppState> {
    Router::new().route("/*href", get(get_resource))
}

/// GET /resources/*href
async fn get_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(href): Path<String>,
) -> Result<Response> {
    // Without a book there is nothing to serve; answer 404 rather than
    // redirecting an image request to the upload page
    let id = cookie::session_id(&headers, state.cookie_name())
        .ok_or_else(|| AppError::ResourceNotFound(href.clone()))?;
    let book = state
        .sessions()
        .get(id)
        .await
        .map_err(|_| AppError::ResourceNotFound(href.clone()))?;

    let resource = book.content().resource(&href).map_err(|e| match e {
        ParseError::ResourceNotFound(href) => AppError::ResourceNotFound(href),
        other => AppError::Internal(other.to_string()),
    })?;

    tracing::debug!(
        href = %href,
        media_type = %resource.media_type,
        size = resource.data.len(),
        "Serving resource"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, resource.media_type)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CONTENT_SECURITY_POLICY, RESOURCE_CSP)
        .body(Body::from(resource.data))
        .map_err(|e| AppError::Internal(e.to_string()))
}
