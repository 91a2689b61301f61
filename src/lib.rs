//! Library crate for hypernucleus-server, exposing modules for binaries and integration tests.

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
/// Persistence: entities and the storage backends.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business logic shared by the routes.
pub mod services;
/// Application state shared across handlers.
pub mod state;

/// Build the top-level router and attach cross-cutting middleware layers.
pub fn build_router(state: state::SharedState) -> Router<()> {
    let body_limit = state.config().max_upload_bytes;
    routes::router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
