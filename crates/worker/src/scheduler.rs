//! Periodic scan rounds.
//!
//! Each round fetches the targets, builds one producer per target and kind,
//! and runs the producers on a bounded pool. Every scan runs under a
//! deadline; a scan that overruns is dropped whole and nothing it saw is
//! submitted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use paranoia_core::entity::{EntityType, Target};
use paranoia_producers::{AnyProducer, Producer, ProducerKind, ProducerSettings};
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::config::WorkerConfig;

/// Counters for one scan round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    /// Identifiers returned by the API.
    pub targets: usize,
    /// Producers that were built and started.
    pub scans: usize,
    /// Scans dropped at the deadline.
    pub timed_out: usize,
    /// Updates accepted by the API.
    pub submitted: usize,
    /// Updates the API never accepted.
    pub failed: usize,
}

/// Drives scan rounds against one API.
pub struct Scheduler {
    api: ApiClient,
    http: reqwest::Client,
    kinds: Vec<ProducerKind>,
    settings: ProducerSettings,
    entity_type: EntityType,
    interval: Duration,
    deadline: Duration,
    concurrency: usize,
}

impl Scheduler {
    pub fn new(config: &WorkerConfig, http: reqwest::Client) -> Self {
        Self {
            api: ApiClient::new(http.clone(), &config.api_url),
            http,
            kinds: config.producers.clone(),
            settings: config.producer_settings.clone(),
            entity_type: config.scan_entity_type,
            interval: config.scan_interval,
            deadline: config.scan_deadline,
            concurrency: config.scan_concurrency.max(1),
        }
    }

    /// Swap the API client (e.g. to shorten retry delays).
    pub fn with_api_client(mut self, api: ApiClient) -> Self {
        self.api = api;
        self
    }

    /// Run a round immediately and then every `interval` until `cancel` is
    /// triggered. Cancelling mid-round drops the in-flight scans.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            producers = ?self.kinds,
            entity_type = %self.entity_type,
            interval_secs = self.interval.as_secs(),
            deadline_secs = self.deadline.as_secs(),
            concurrency = self.concurrency,
            "Scan scheduler started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scan scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!("Scan scheduler stopping, abandoning current round");
                            break;
                        }
                        summary = self.run_once() => {
                            tracing::info!(?summary, "Scan round finished");
                        }
                    }
                }
            }
        }
    }

    /// One full scan round.
    pub async fn run_once(&self) -> RoundSummary {
        let mut summary = RoundSummary::default();

        let identifiers = match self.api.fetch_targets(self.entity_type).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch scan targets");
                return summary;
            }
        };
        summary.targets = identifiers.len();

        if identifiers.is_empty() {
            tracing::info!(entity_type = %self.entity_type, "No entities to scan");
            return summary;
        }

        let producers = self.build_producers(&identifiers);
        summary.scans = producers.len();

        let timed_out = AtomicUsize::new(0);
        let submitted = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        futures::stream::iter(producers)
            .for_each_concurrent(self.concurrency, |producer| {
                let (timed_out, submitted, failed) = (&timed_out, &submitted, &failed);
                async move {
                    let target = producer.target().clone();
                    let source = producer.source().clone();
                    let kind = producer.kind();

                    let updates = match tokio::time::timeout(self.deadline, producer.scan()).await {
                        Ok(updates) => updates,
                        Err(_) => {
                            tracing::warn!(
                                entity = %target,
                                producer = kind.as_str(),
                                deadline_secs = self.deadline.as_secs(),
                                "Scan exceeded its deadline, results discarded"
                            );
                            timed_out.fetch_add(1, Ordering::Relaxed);
                            return;
                        }
                    };

                    for update in &updates {
                        match self.api.submit(&update.to_incoming(&target, &source)).await {
                            Ok(status) => {
                                tracing::debug!(
                                    entity = %target,
                                    metric = update.metric(),
                                    status = %status,
                                    "Update submitted"
                                );
                                submitted.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                tracing::error!(
                                    entity = %target,
                                    metric = update.metric(),
                                    error = %e,
                                    "Update was not accepted"
                                );
                                failed.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                }
            })
            .await;

        summary.timed_out = timed_out.into_inner();
        summary.submitted = submitted.into_inner();
        summary.failed = failed.into_inner();
        summary
    }

    /// One producer per `(identifier, kind)` the producer accepts.
    fn build_producers(&self, identifiers: &[String]) -> Vec<AnyProducer> {
        let mut producers = Vec::new();
        for identifier in identifiers {
            let target = match Target::new(identifier, self.entity_type.as_str()) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!(identifier = %identifier, error = %e, "Skipping invalid target");
                    continue;
                }
            };

            for kind in &self.kinds {
                match AnyProducer::build(*kind, target.clone(), &self.settings, &self.http) {
                    Ok(producer) => producers.push(producer),
                    Err(e) => tracing::debug!(
                        entity = %target,
                        producer = kind.as_str(),
                        error = %e,
                        "Producer not applicable"
                    ),
                }
            }
        }
        producers
    }
}
