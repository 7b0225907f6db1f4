//! Observation log row model.

use paranoia_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the append-only `updates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ObservationRow {
    pub id: DbId,
    pub entity: String,
    pub entity_type: String,
    pub source: String,
    pub metric: String,
    pub value: String,
    pub observed_at: Timestamp,
    pub received_at: Timestamp,
}
