//! Monitored entities and their metric sets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Version;
use crate::validate::{validate_identifier, Identifier};

/// The kind of asset an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Host,
    Website,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Website => "website",
        }
    }

    /// Parse a canonical type name (`host` or `website`), ignoring case and
    /// surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_lowercase().as_str() {
            "host" => Ok(Self::Host),
            "website" => Ok(Self::Website),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown entity type '{other}', expected 'host' or 'website'"
            ))),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named observable property of an entity, owned by its originating source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub source: String,
    pub name: String,
    pub value: String,
}

/// A monitored asset and the current value of every metric observed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub identifier: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub metrics: Vec<Metric>,
}

impl Entity {
    /// Metric with the given name, if any. Names are unique per entity.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// An entity as read from the store, together with the version that a
/// conditional write must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedEntity {
    pub entity: Entity,
    pub version: Version,
}

/// A validated `(identifier, type)` pair: the lookup key of an entity and the
/// thing a producer scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub identifier: Identifier,
    pub entity_type: EntityType,
}

impl Target {
    pub fn new(identifier: &str, entity_type: &str) -> Result<Self, CoreError> {
        Ok(Self {
            identifier: validate_identifier(identifier)?,
            entity_type: EntityType::parse(entity_type)?,
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier, self.entity_type)
    }
}
