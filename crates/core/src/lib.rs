//! Paranoia core domain.
//!
//! Pure validation, the entity/update data model, the [`store::EntityStore`]
//! seam, and the two services built on it: the reconciliation engine that
//! merges observations into entities and the query service that lists them.
//! Nothing in this crate talks to a concrete database.

pub mod entity;
pub mod error;
pub mod query;
pub mod reconcile;
pub mod store;
pub mod types;
pub mod update;
pub mod validate;
