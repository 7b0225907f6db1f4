//! Repository for the `entities` table.

use paranoia_core::entity::{EntityType, Metric};
use paranoia_core::types::Version;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::entity::EntityRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, identifier, entity_type, metrics, version, created_at, updated_at";

/// Provides lookup and conditional-write operations for entities.
pub struct EntityRepo;

impl EntityRepo {
    /// Insert an entity with no metrics. Out-of-band provisioning only; the
    /// ingestion path never calls this.
    pub async fn provision(
        pool: &PgPool,
        identifier: &str,
        entity_type: EntityType,
    ) -> Result<EntityRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO entities (identifier, entity_type)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntityRow>(&query)
            .bind(identifier)
            .bind(entity_type.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find an entity by its `(identifier, entity_type)` key.
    pub async fn find_by_key(
        pool: &PgPool,
        identifier: &str,
        entity_type: EntityType,
    ) -> Result<Option<EntityRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entities WHERE identifier = $1 AND entity_type = $2"
        );
        sqlx::query_as::<_, EntityRow>(&query)
            .bind(identifier)
            .bind(entity_type.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the metric collection if the row is still at
    /// `expected_version`, bumping the version in the same statement.
    ///
    /// Returns `true` if the row was written.
    pub async fn replace_metrics_if_version(
        pool: &PgPool,
        identifier: &str,
        entity_type: EntityType,
        expected_version: Version,
        metrics: &[Metric],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE entities SET
                metrics = $4,
                version = version + 1,
                updated_at = NOW()
             WHERE identifier = $1 AND entity_type = $2 AND version = $3",
        )
        .bind(identifier)
        .bind(entity_type.as_str())
        .bind(expected_version)
        .bind(Json(metrics))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Distinct identifiers, optionally restricted to one type, sorted.
    pub async fn list_identifiers(
        pool: &PgPool,
        entity_type: Option<EntityType>,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT identifier FROM entities
             WHERE $1::TEXT IS NULL OR entity_type = $1
             ORDER BY identifier",
        )
        .bind(entity_type.map(|t| t.as_str()))
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(identifier,)| identifier).collect())
    }
}
