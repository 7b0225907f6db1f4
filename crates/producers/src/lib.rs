//! Producers: scanners that observe one entity and emit metric updates.
//!
//! Each concrete producer is validated at construction and consumed by
//! [`Producer::scan`]. Scan failures never escape; they are logged and
//! reported as an empty update sequence.

pub mod error;
pub mod network_recon;
pub mod producer;
pub mod reputation;

pub use error::{ProducerError, ScanError};
pub use network_recon::{NetworkReconProducer, NmapSettings};
pub use producer::{AnyProducer, Producer, ProducerKind, ProducerSettings};
pub use reputation::{CrowdsecSettings, ReputationProducer};
