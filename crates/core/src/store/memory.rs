//! In-memory [`EntityStore`].
//!
//! Thread-safe, process-local, and lost on restart. Used by the test suites
//! and for running the API without a database.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::entity::{Entity, EntityType, Metric, VersionedEntity};
use crate::error::CoreError;
use crate::store::EntityStore;
use crate::types::Version;
use crate::update::IncomingUpdate;

type EntityKey = (String, EntityType);

#[derive(Debug, Default)]
struct State {
    entities: HashMap<EntityKey, VersionedEntity>,
    observations: Vec<IncomingUpdate>,
}

/// Store backed by a `HashMap` behind a lock.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    state: RwLock<State>,
}

fn lock_err(context: &'static str) -> CoreError {
    CoreError::StoreUnavailable(format!("poisoned lock: {context}"))
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an entity out-of-band, replacing any existing record with
    /// the same key. The version starts at zero.
    pub fn provision(&self, entity: Entity) -> Result<(), CoreError> {
        let mut state = self.state.write().map_err(|_| lock_err("provision"))?;
        let key = (entity.identifier.clone(), entity.entity_type);
        state
            .entities
            .insert(key, VersionedEntity { entity, version: 0 });
        Ok(())
    }

    /// Snapshot of the whole observation log, oldest first.
    pub fn observations(&self) -> Result<Vec<IncomingUpdate>, CoreError> {
        let state = self.state.read().map_err(|_| lock_err("observations"))?;
        Ok(state.observations.clone())
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn ping(&self) -> Result<(), CoreError> {
        self.state.read().map(|_| ()).map_err(|_| lock_err("ping"))
    }

    async fn find_entity(
        &self,
        identifier: &str,
        entity_type: EntityType,
    ) -> Result<Option<VersionedEntity>, CoreError> {
        let state = self.state.read().map_err(|_| lock_err("find_entity"))?;
        Ok(state
            .entities
            .get(&(identifier.to_string(), entity_type))
            .cloned())
    }

    async fn append_observation(&self, update: &IncomingUpdate) -> Result<(), CoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("append_observation"))?;
        state.observations.push(update.clone());
        Ok(())
    }

    async fn replace_metrics(
        &self,
        identifier: &str,
        entity_type: EntityType,
        expected_version: Version,
        metrics: &[Metric],
    ) -> Result<bool, CoreError> {
        let mut state = self.state.write().map_err(|_| lock_err("replace_metrics"))?;
        let Some(stored) = state
            .entities
            .get_mut(&(identifier.to_string(), entity_type))
        else {
            return Ok(false);
        };
        if stored.version != expected_version {
            return Ok(false);
        }
        stored.entity.metrics = metrics.to_vec();
        stored.version += 1;
        Ok(true)
    }

    async fn list_identifiers(
        &self,
        entity_type: Option<EntityType>,
    ) -> Result<Vec<String>, CoreError> {
        let state = self.state.read().map_err(|_| lock_err("list_identifiers"))?;
        Ok(state
            .entities
            .values()
            .filter(|v| entity_type.is_none_or(|t| v.entity.entity_type == t))
            .map(|v| v.entity.identifier.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(identifier: &str) -> Entity {
        Entity {
            identifier: identifier.to_string(),
            entity_type: EntityType::Host,
            metrics: vec![],
        }
    }

    #[tokio::test]
    async fn replace_metrics_checks_version() {
        let store = MemoryEntityStore::new();
        store.provision(host("10.0.0.1")).unwrap();

        let metrics = vec![Metric {
            source: "Scanner".to_string(),
            name: "State".to_string(),
            value: "up".to_string(),
        }];

        assert!(store
            .replace_metrics("10.0.0.1", EntityType::Host, 0, &metrics)
            .await
            .unwrap());
        // Stale version is refused.
        assert!(!store
            .replace_metrics("10.0.0.1", EntityType::Host, 0, &[])
            .await
            .unwrap());

        let stored = store
            .find_entity("10.0.0.1", EntityType::Host)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.entity.metrics, metrics);
    }

    #[tokio::test]
    async fn replace_metrics_on_missing_entity_is_a_conflict() {
        let store = MemoryEntityStore::new();
        assert!(!store
            .replace_metrics("10.0.0.9", EntityType::Host, 0, &[])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn entities_are_keyed_by_identifier_and_type() {
        let store = MemoryEntityStore::new();
        store.provision(host("example.com")).unwrap();

        assert!(store
            .find_entity("example.com", EntityType::Website)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_entity("example.com", EntityType::Host)
            .await
            .unwrap()
            .is_some());
    }
}
