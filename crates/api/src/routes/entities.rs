//! Route definitions for entity ingestion and queries.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::entities;
use crate::state::AppState;

/// Largest accepted update body, well above six maximum-length fields.
pub const MAX_UPDATE_BODY_BYTES: usize = 16 * 1024;

/// Routes mounted under `/api/v1`.
///
/// ```text
/// POST   /entity                            -> ingest
/// GET    /entities                          -> list
/// GET    /entities/{type}/{identifier}      -> get_by_key
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/entity",
            post(entities::ingest).layer(DefaultBodyLimit::max(MAX_UPDATE_BODY_BYTES)),
        )
        .route("/entities", get(entities::list))
        .route("/entities/{entity_type}/{identifier}", get(entities::get_by_key))
}
