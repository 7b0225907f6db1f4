//! Entity row model.

use paranoia_core::entity::{Entity, EntityType, Metric, VersionedEntity};
use paranoia_core::error::CoreError;
use paranoia_core::types::{DbId, Timestamp, Version};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `entities` table.
#[derive(Debug, Clone, FromRow)]
pub struct EntityRow {
    pub id: DbId,
    pub identifier: String,
    pub entity_type: String,
    pub metrics: Json<Vec<Metric>>,
    pub version: Version,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EntityRow {
    /// Convert into the domain type. Fails only if the row violates the
    /// `entity_type` check constraint.
    pub fn into_versioned(self) -> Result<VersionedEntity, CoreError> {
        let entity_type = EntityType::parse(&self.entity_type)
            .map_err(|e| CoreError::StoreUnavailable(format!("corrupt entity row {}: {e}", self.id)))?;
        Ok(VersionedEntity {
            entity: Entity {
                identifier: self.identifier,
                entity_type,
                metrics: self.metrics.0,
            },
            version: self.version,
        })
    }
}
