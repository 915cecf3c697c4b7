//! Session cookie handling

use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

/// Find the session id in the request's `Cookie` headers
pub fn session_id(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value binding the browser to a session
pub fn set_session(cookie_name: &str, id: Uuid, max_age_secs: i64) -> HeaderValue {
    let value = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        cookie_name,
        id,
        max_age_secs.max(0)
    );
    // Cookie names come from configuration; fall back to a bare expiry if invalid
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("Max-Age=0"))
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session(cookie_name: &str) -> HeaderValue {
    let value = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", cookie_name);
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("Max-Age=0"))
}
