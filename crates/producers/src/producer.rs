//! The producer capability and the closed set of producer kinds.

use std::future::Future;
use std::str::FromStr;

use paranoia_core::entity::Target;
use paranoia_core::update::Update;
use paranoia_core::validate::Source;

use crate::error::ProducerError;
use crate::network_recon::{NetworkReconProducer, NmapSettings};
use crate::reputation::{CrowdsecSettings, ReputationProducer};

/// A scanner bound to one target.
///
/// `scan` consumes the producer: the returned updates are built eagerly and
/// a rescan needs a new instance.
pub trait Producer: Send {
    /// Name recorded as the source of every emitted update.
    fn source(&self) -> &Source;

    /// The entity being scanned.
    fn target(&self) -> &Target;

    /// Observe the target. Failures are logged and yield an empty sequence.
    fn scan(self) -> impl Future<Output = Vec<Update>> + Send;
}

/// Every producer the worker knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerKind {
    NetworkRecon,
    Reputation,
}

impl ProducerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkRecon => "network_recon",
            Self::Reputation => "reputation",
        }
    }

    /// Parse a comma-separated list such as `"network_recon, reputation"`.
    /// Empty items are skipped; duplicates are kept once.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ProducerError> {
        let mut kinds = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind: Self = item.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }
}

impl FromStr for ProducerKind {
    type Err = ProducerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "network_recon" | "nmap" => Ok(Self::NetworkRecon),
            "reputation" | "crowdsec" => Ok(Self::Reputation),
            other => Err(ProducerError::UnknownKind(other.to_string())),
        }
    }
}

/// Settings needed to construct any producer kind.
#[derive(Debug, Clone, Default)]
pub struct ProducerSettings {
    pub nmap: NmapSettings,
    pub crowdsec: CrowdsecSettings,
}

/// A constructed producer of any kind.
#[derive(Debug)]
pub enum AnyProducer {
    NetworkRecon(NetworkReconProducer),
    Reputation(ReputationProducer),
}

impl AnyProducer {
    /// Build a producer of `kind` for `target`.
    ///
    /// `client` is shared by producers that speak HTTP.
    pub fn build(
        kind: ProducerKind,
        target: Target,
        settings: &ProducerSettings,
        client: &reqwest::Client,
    ) -> Result<Self, ProducerError> {
        match kind {
            ProducerKind::NetworkRecon => {
                NetworkReconProducer::new(target, settings.nmap.clone()).map(Self::NetworkRecon)
            }
            ProducerKind::Reputation => {
                ReputationProducer::new(target, &settings.crowdsec, client.clone())
                    .map(Self::Reputation)
            }
        }
    }

    pub fn kind(&self) -> ProducerKind {
        match self {
            Self::NetworkRecon(_) => ProducerKind::NetworkRecon,
            Self::Reputation(_) => ProducerKind::Reputation,
        }
    }
}

impl Producer for AnyProducer {
    fn source(&self) -> &Source {
        match self {
            Self::NetworkRecon(p) => p.source(),
            Self::Reputation(p) => p.source(),
        }
    }

    fn target(&self) -> &Target {
        match self {
            Self::NetworkRecon(p) => p.target(),
            Self::Reputation(p) => p.target(),
        }
    }

    async fn scan(self) -> Vec<Update> {
        match self {
            Self::NetworkRecon(p) => p.scan().await,
            Self::Reputation(p) => p.scan().await,
        }
    }
}
