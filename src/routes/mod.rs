//! Route modules for Lector Server

pub mod health;
pub mod reader;
pub mod resources;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config().upload.max_bytes;

    Router::new()
        .route("/health", get(health::health_check))
        .merge(reader::router(max_upload_bytes))
        .nest("/resources", resources::router())
        .with_state(state)
}
