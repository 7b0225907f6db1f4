//! Row types mapped with `sqlx::FromRow`.

pub mod entity;
pub mod update;
