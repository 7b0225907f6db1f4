//! The entity store seam.
//!
//! [`EntityStore`] is the only way the engine and query service reach
//! durable state. The PostgreSQL implementation lives in `paranoia-db`;
//! [`memory::MemoryEntityStore`] backs tests and local development.

pub mod memory;

use async_trait::async_trait;

use crate::entity::{EntityType, Metric, VersionedEntity};
use crate::error::CoreError;
use crate::types::Version;
use crate::update::IncomingUpdate;

/// Durable storage for entity records and the observation log.
///
/// Implementations report transport failures as
/// [`CoreError::StoreUnavailable`].
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), CoreError>;

    /// Load the entity keyed by `(identifier, entity_type)`.
    async fn find_entity(
        &self,
        identifier: &str,
        entity_type: EntityType,
    ) -> Result<Option<VersionedEntity>, CoreError>;

    /// Append one observation to the log. Never updates or deletes.
    async fn append_observation(&self, update: &IncomingUpdate) -> Result<(), CoreError>;

    /// Replace the entity's full metric collection if its stored version is
    /// still `expected_version`, bumping the version.
    ///
    /// Returns `false` when the version check fails (a concurrent writer got
    /// there first, or the entity disappeared).
    async fn replace_metrics(
        &self,
        identifier: &str,
        entity_type: EntityType,
        expected_version: Version,
        metrics: &[Metric],
    ) -> Result<bool, CoreError>;

    /// Identifiers of all entities, or of one type only.
    async fn list_identifiers(
        &self,
        entity_type: Option<EntityType>,
    ) -> Result<Vec<String>, CoreError>;

    /// Release the underlying connections. Further calls may fail.
    async fn close(&self) {}
}
