//! Paranoia scan worker.
//!
//! Periodically fetches the entities to watch from the API, runs every
//! configured producer against each of them under a deadline, and submits
//! the resulting updates back to the API one at a time.

pub mod client;
pub mod config;
pub mod scheduler;
