//! Handlers for entity ingestion and queries.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use paranoia_core::entity::Entity;
use paranoia_core::reconcile::ApplyResult;
use paranoia_core::update::IncomingUpdate;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Outcome of one ingested observation.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: ApplyResult,
}

/// Query parameters for the entity listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Free-text type filter, e.g. `host`, `"Websites"`, ` WEB `.
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
}

/// POST /api/v1/entity
///
/// The body must be a JSON object with exactly the six update fields, each
/// given once.
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<IngestResponse>> {
    let update = IncomingUpdate::from_slice(&body)?;

    let status = state.engine.apply_update(&update).await?;
    Ok(Json(IngestResponse { status }))
}

/// GET /api/v1/entities
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let identifiers = state
        .query
        .list_entities(params.entity_type.as_deref())
        .await?;
    Ok(Json(DataResponse { data: identifiers }))
}

/// GET /api/v1/entities/{type}/{identifier}
pub async fn get_by_key(
    State(state): State<AppState>,
    Path((entity_type, identifier)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<Entity>>> {
    let entity = state.query.get_entity(&entity_type, &identifier).await?;
    Ok(Json(DataResponse { data: entity }))
}
