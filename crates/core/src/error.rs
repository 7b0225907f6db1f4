use crate::entity::EntityType;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Entity not found: {identifier} ({entity_type})")]
    EntityNotFound {
        identifier: String,
        entity_type: EntityType,
    },

    #[error("No entities found")]
    NoEntities,

    #[error("Concurrent modification of {identifier} ({entity_type}) after {attempts} attempts")]
    ConcurrentModification {
        identifier: String,
        entity_type: EntityType,
        attempts: u32,
    },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}
