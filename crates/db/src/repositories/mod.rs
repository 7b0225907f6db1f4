//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod entity_repo;
pub mod update_repo;

pub use entity_repo::EntityRepo;
pub use update_repo::UpdateRepo;
