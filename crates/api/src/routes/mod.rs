pub mod entities;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /entity                                          ingest one observation (POST)
/// /entities                                        list identifiers (GET, ?type=)
/// /entities/{type}/{identifier}                    entity detail (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(entities::router())
}
