//! Repository for the append-only `updates` table.

use paranoia_core::update::IncomingUpdate;
use sqlx::PgPool;

use crate::models::update::ObservationRow;

const COLUMNS: &str = "id, entity, entity_type, source, metric, value, observed_at, received_at";

/// Provides insert and read access to the observation log.
pub struct UpdateRepo;

impl UpdateRepo {
    /// Append one observation verbatim.
    pub async fn insert(pool: &PgPool, update: &IncomingUpdate) -> Result<ObservationRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO updates (entity, entity_type, source, metric, value, observed_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ObservationRow>(&query)
            .bind(&update.entity)
            .bind(&update.entity_type)
            .bind(&update.source)
            .bind(&update.metric)
            .bind(&update.value)
            .bind(update.timestamp)
            .fetch_one(pool)
            .await
    }

    /// Observations recorded for an entity, oldest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity: &str,
        entity_type: &str,
    ) -> Result<Vec<ObservationRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM updates
             WHERE entity = $1 AND entity_type = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, ObservationRow>(&query)
            .bind(entity)
            .bind(entity_type)
            .fetch_all(pool)
            .await
    }
}
