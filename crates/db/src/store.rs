//! PostgreSQL-backed [`EntityStore`].

use async_trait::async_trait;
use paranoia_core::entity::{EntityType, Metric, VersionedEntity};
use paranoia_core::error::CoreError;
use paranoia_core::store::EntityStore;
use paranoia_core::types::Version;
use paranoia_core::update::IncomingUpdate;

use crate::repositories::{EntityRepo, UpdateRepo};
use crate::DbPool;

/// Entity store over a PostgreSQL connection pool.
///
/// Construct once at startup with [`PgEntityStore::connect`] (or
/// [`PgEntityStore::new`] around an existing pool) and share it behind an
/// `Arc`. Call [`EntityStore::close`] on shutdown.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: DbPool,
}

/// Map a database error onto the core error the engine understands.
fn unavailable(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Entity store query failed");
    CoreError::StoreUnavailable(err.to_string())
}

impl PgEntityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a pool, verify connectivity, and apply migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, CoreError> {
        let pool = crate::create_pool(database_url, max_connections)
            .await
            .map_err(unavailable)?;
        crate::health_check(&pool).await.map_err(unavailable)?;
        crate::run_migrations(&pool)
            .await
            .map_err(|e| CoreError::StoreUnavailable(format!("migrations failed: {e}")))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn ping(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(unavailable)
    }

    async fn find_entity(
        &self,
        identifier: &str,
        entity_type: EntityType,
    ) -> Result<Option<VersionedEntity>, CoreError> {
        EntityRepo::find_by_key(&self.pool, identifier, entity_type)
            .await
            .map_err(unavailable)?
            .map(|row| row.into_versioned())
            .transpose()
    }

    async fn append_observation(&self, update: &IncomingUpdate) -> Result<(), CoreError> {
        UpdateRepo::insert(&self.pool, update)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn replace_metrics(
        &self,
        identifier: &str,
        entity_type: EntityType,
        expected_version: Version,
        metrics: &[Metric],
    ) -> Result<bool, CoreError> {
        EntityRepo::replace_metrics_if_version(
            &self.pool,
            identifier,
            entity_type,
            expected_version,
            metrics,
        )
        .await
        .map_err(unavailable)
    }

    async fn list_identifiers(
        &self,
        entity_type: Option<EntityType>,
    ) -> Result<Vec<String>, CoreError> {
        EntityRepo::list_identifiers(&self.pool, entity_type)
            .await
            .map_err(unavailable)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
