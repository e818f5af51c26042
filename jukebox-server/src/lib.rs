//! Jukebox relay server library
//!
//! Serves the sound library and relays tokens between connected clients.
//!
//! **Endpoints:**
//! - `GET /play/` manifest (token → sound URL)
//! - `GET /library/` sorted token list
//! - `GET /health` liveness
//! - `GET /ws` token stream (WebSocket)
//! - `GET /sounds/*` sound files

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use jukebox_common::Manifest;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod hub;
pub mod library;

use hub::Hub;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Sound library, fixed at startup
    pub library: Arc<Manifest>,
    /// Token relay between stream clients
    pub hub: Hub,
}

impl AppState {
    pub fn new(library: Manifest, broadcast_capacity: usize) -> Self {
        Self {
            library: Arc::new(library),
            hub: Hub::new(broadcast_capacity),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState, sounds_dir: &Path) -> Router {
    Router::new()
        .merge(api::library_routes())
        .merge(api::stream_routes())
        .merge(api::health_routes())
        .nest_service("/sounds", ServeDir::new(sounds_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
