//! Read side: listing entities and fetching one entity's metrics.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::entity::{Entity, EntityType};
use crate::error::CoreError;
use crate::store::EntityStore;
use crate::validate::validate_identifier;

/// A normalized entity type filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Only(EntityType),
    /// Matches no known type, so matches no entity.
    Unknown(String),
}

/// Normalize a free-text type filter.
///
/// Trims, lowercases, and strips surrounding quote characters. Any token
/// containing `web` means websites, any containing `host` means hosts; an
/// empty token means no filter.
pub fn normalize_type_filter(raw: Option<&str>) -> TypeFilter {
    let Some(raw) = raw else {
        return TypeFilter::All;
    };

    let token = raw
        .trim()
        .to_lowercase()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string();

    if token.is_empty() {
        TypeFilter::All
    } else if token.contains("web") {
        TypeFilter::Only(EntityType::Website)
    } else if token.contains("host") {
        TypeFilter::Only(EntityType::Host)
    } else {
        TypeFilter::Unknown(token)
    }
}

/// Lists and reads entities from an [`EntityStore`].
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn EntityStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Distinct identifiers of entities matching the type filter, sorted.
    ///
    /// An empty result is an error ([`CoreError::NoEntities`]), never an
    /// empty success.
    pub async fn list_entities(&self, type_filter: Option<&str>) -> Result<Vec<String>, CoreError> {
        let entity_type = match normalize_type_filter(type_filter) {
            TypeFilter::All => None,
            TypeFilter::Only(t) => Some(t),
            TypeFilter::Unknown(token) => {
                tracing::debug!(filter = %token, "Type filter matches no known entity type");
                return Err(CoreError::NoEntities);
            }
        };

        let identifiers: BTreeSet<String> = self
            .store
            .list_identifiers(entity_type)
            .await?
            .into_iter()
            .collect();

        if identifiers.is_empty() {
            return Err(CoreError::NoEntities);
        }

        tracing::debug!(count = identifiers.len(), entity_type = ?entity_type, "Listed entities");
        Ok(identifiers.into_iter().collect())
    }

    /// One entity with its current metrics.
    pub async fn get_entity(&self, entity_type: &str, identifier: &str) -> Result<Entity, CoreError> {
        let entity_type = EntityType::parse(entity_type)?;
        let identifier = validate_identifier(identifier)?;

        self.store
            .find_entity(identifier.as_str(), entity_type)
            .await?
            .map(|v| v.entity)
            .ok_or_else(|| CoreError::EntityNotFound {
                identifier: identifier.into_inner(),
                entity_type,
            })
    }
}
