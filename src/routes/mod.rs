pub mod auth;
pub mod playlists;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(playlists::routes())
}

async fn health() -> &'static str {
    "ok"
}
