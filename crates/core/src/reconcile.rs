//! Reconciliation engine.
//!
//! Merges one [`IncomingUpdate`] into the stored metric set of the entity it
//! describes. The merge policy is "first writer owns the metric name": once a
//! source has created a metric on an entity, only that source may change its
//! value. Every accepted update is written to the observation log, whether or
//! not it changes the entity.
//!
//! Writes are conditional on the entity version read at the start of the
//! attempt. A lost race re-reads and re-merges, up to
//! [`ReconciliationEngine::max_attempts`] times.

use std::sync::Arc;

use serde::Serialize;

use crate::entity::{Metric, VersionedEntity};
use crate::error::CoreError;
use crate::store::EntityStore;
use crate::update::{IncomingUpdate, ValidatedUpdate};

/// Default number of read-merge-write attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Outcome of a successful [`ReconciliationEngine::apply_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyResult {
    /// A metric with this name did not exist and was appended.
    Added,
    /// The owning source changed the metric's value.
    Updated,
    /// Logged only: same value, or the metric belongs to another source.
    Unchanged,
}

/// What to do with an entity's metric set for one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDecision {
    Append(Metric),
    Replace { index: usize, value: String },
    /// The metric name is owned by a different source.
    NotOwner { owner: String },
    SameValue,
}

/// Decide how `update` merges into `metrics`. Pure; no I/O.
pub fn decide(metrics: &[Metric], update: &ValidatedUpdate) -> MergeDecision {
    let name = update.metric.as_str();
    let Some(index) = metrics.iter().position(|m| m.name == name) else {
        return MergeDecision::Append(Metric {
            source: update.source.to_string(),
            name: name.to_string(),
            value: update.value.to_string(),
        });
    };

    let existing = &metrics[index];
    if existing.source != update.source.as_str() {
        MergeDecision::NotOwner {
            owner: existing.source.clone(),
        }
    } else if existing.value == update.value.as_str() {
        MergeDecision::SameValue
    } else {
        MergeDecision::Replace {
            index,
            value: update.value.to_string(),
        }
    }
}

/// Applies observations to entities held in an [`EntityStore`].
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn EntityStore>,
    max_attempts: u32,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_ATTEMPTS)
    }

    /// `max_attempts` is clamped to at least one.
    pub fn with_max_attempts(store: Arc<dyn EntityStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Validate, log, and merge one observation.
    ///
    /// Fails with [`CoreError::InvalidUpdate`] before touching the store,
    /// [`CoreError::EntityNotFound`] before logging, and
    /// [`CoreError::ConcurrentModification`] if every conditional write lost
    /// its race.
    pub async fn apply_update(&self, update: &IncomingUpdate) -> Result<ApplyResult, CoreError> {
        let validated = update.validate()?;
        let identifier = validated.target.identifier.as_str();
        let entity_type = validated.target.entity_type;

        let mut current = self.load(&validated).await?;

        self.store.append_observation(update).await?;

        for attempt in 1..=self.max_attempts {
            let (metrics, result) = match decide(&current.entity.metrics, &validated) {
                MergeDecision::Append(metric) => {
                    let mut metrics = current.entity.metrics.clone();
                    metrics.push(metric);
                    (metrics, ApplyResult::Added)
                }
                MergeDecision::Replace { index, value } => {
                    let mut metrics = current.entity.metrics.clone();
                    metrics[index].value = value;
                    (metrics, ApplyResult::Updated)
                }
                MergeDecision::NotOwner { owner } => {
                    tracing::debug!(
                        entity = %identifier,
                        metric = %validated.metric,
                        source = %validated.source,
                        owner = %owner,
                        "Metric owned by another source, value left unchanged"
                    );
                    return Ok(ApplyResult::Unchanged);
                }
                MergeDecision::SameValue => return Ok(ApplyResult::Unchanged),
            };

            let written = self
                .store
                .replace_metrics(identifier, entity_type, current.version, &metrics)
                .await?;

            if written {
                tracing::info!(
                    entity = %identifier,
                    entity_type = %entity_type,
                    metric = %validated.metric,
                    result = ?result,
                    "Entity metrics updated"
                );
                return Ok(result);
            }

            tracing::warn!(
                entity = %identifier,
                attempt,
                max_attempts = self.max_attempts,
                "Entity version changed during merge, retrying"
            );
            current = self.load(&validated).await?;
        }

        Err(CoreError::ConcurrentModification {
            identifier: identifier.to_string(),
            entity_type,
            attempts: self.max_attempts,
        })
    }

    async fn load(&self, update: &ValidatedUpdate) -> Result<VersionedEntity, CoreError> {
        let identifier = update.target.identifier.as_str();
        let entity_type = update.target.entity_type;
        self.store
            .find_entity(identifier, entity_type)
            .await?
            .ok_or_else(|| CoreError::EntityNotFound {
                identifier: identifier.to_string(),
                entity_type,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
