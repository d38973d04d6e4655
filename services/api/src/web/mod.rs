pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CACHE_CONTROL, HeaderValue},
    routing::{delete, get, post},
    Router,
};
use rest::{
    add_note_handler, delete_note_handler, health_handler, list_notes_handler,
    list_points_handler, meta_handler, submit_form_handler, submit_handler,
};
use state::AppState;
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
};

/// Request bodies above this size are rejected before reaching a handler.
pub const BODY_LIMIT_BYTES: usize = 300 * 1024;

/// The JSON API, the form fallback and the health check.
pub fn api_routes(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/points", get(list_points_handler))
        .route("/api/meta", get(meta_handler))
        .route("/api/submit", post(submit_handler))
        .route(
            "/api/points/{id}/notes",
            get(list_notes_handler).post(add_note_handler),
        )
        .route("/api/points/{id}/notes/{index}", delete(delete_note_handler))
        .route("/submit", post(submit_form_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(app_state)
}

/// The browser pages. Nothing here is cached so a redeploy shows up on reload.
pub fn static_routes(static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/form", ServeFile::new(static_dir.join("form.html")))
        .fallback_service(ServeDir::new(static_dir))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

/// The full application router minus documentation and CORS.
pub fn app_router(app_state: Arc<AppState>, static_dir: &Path) -> Router {
    api_routes(app_state).merge(static_routes(static_dir))
}
