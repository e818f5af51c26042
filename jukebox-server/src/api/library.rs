//! Sound library endpoints

use axum::{extract::State, routing::get, Json, Router};
use jukebox_common::{Manifest, Token};

use crate::AppState;

/// GET /play/
///
/// The manifest clients resolve tokens against.
pub async fn get_manifest(State(state): State<AppState>) -> Json<Manifest> {
    Json(state.library.as_ref().clone())
}

/// GET /library/
///
/// Token names only, sorted.
pub async fn list_tokens(State(state): State<AppState>) -> Json<Vec<Token>> {
    Json(state.library.keys().cloned().collect())
}

pub fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/play/", get(get_manifest))
        .route("/library/", get(list_tokens))
}
