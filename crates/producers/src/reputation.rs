//! Reputation-lookup producer backed by a CrowdSec Local API.
//!
//! Asks `GET {lapi_url}/v1/decisions?ip={ip}` whether any decision (ban,
//! captcha, ...) is active for an IPv4 host and reports it as a single
//! `Status` metric. Any error along the way yields no updates.

use std::time::Duration;

use paranoia_core::entity::Target;
use paranoia_core::update::Update;
use paranoia_core::validate::{validate_source, IdentifierKind, Source};

use crate::error::{ProducerError, ScanError};
use crate::producer::Producer;

/// Source name recorded on every reputation update.
pub const SOURCE: &str = "Crowdsec";

/// Metric reported by this producer.
pub const STATUS_METRIC: &str = "Status";

pub const BANNED: &str = "Banned";
pub const NOT_BANNED: &str = "Not Banned";

/// HTTP timeout for a single lookup.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// CrowdSec LAPI credentials. Both must be present to build a producer.
#[derive(Debug, Clone, Default)]
pub struct CrowdsecSettings {
    /// Base URL, e.g. `http://127.0.0.1:8080`.
    pub lapi_url: Option<String>,
    /// Bouncer API key sent as `X-Api-Key`.
    pub lapi_key: Option<String>,
}

/// Looks up one IPv4 host in CrowdSec.
#[derive(Debug)]
pub struct ReputationProducer {
    source: Source,
    target: Target,
    client: reqwest::Client,
    lapi_url: String,
    lapi_key: String,
}

impl ReputationProducer {
    pub fn new(
        target: Target,
        settings: &CrowdsecSettings,
        client: reqwest::Client,
    ) -> Result<Self, ProducerError> {
        if target.identifier.kind() != IdentifierKind::Ipv4 {
            return Err(ProducerError::UnsupportedTarget {
                producer: SOURCE,
                identifier: target.identifier.to_string(),
                entity_type: target.entity_type,
                reason: "only IPv4 addresses are supported",
            });
        }

        let lapi_url = settings
            .lapi_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ProducerError::MissingConfiguration {
                producer: SOURCE,
                setting: "CROWDSEC_LAPI_URL",
            })?;
        let lapi_key = settings
            .lapi_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ProducerError::MissingConfiguration {
                producer: SOURCE,
                setting: "CROWDSEC_LAPI_KEY",
            })?;

        Ok(Self {
            source: validate_source(SOURCE)?,
            target,
            client,
            lapi_url: lapi_url.trim_end_matches('/').to_string(),
            lapi_key: lapi_key.to_string(),
        })
    }

    /// `Banned` if CrowdSec lists at least one decision for the address.
    async fn query(&self) -> Result<&'static str, ScanError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/decisions?ip={}",
                self.lapi_url, self.target.identifier
            ))
            .header("X-Api-Key", &self.lapi_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ScanError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let decisions: Option<Vec<serde_json::Value>> = serde_json::from_str(&body)?;

        Ok(match decisions {
            Some(list) if !list.is_empty() => BANNED,
            _ => NOT_BANNED,
        })
    }
}

impl Producer for ReputationProducer {
    fn source(&self) -> &Source {
        &self.source
    }

    fn target(&self) -> &Target {
        &self.target
    }

    async fn scan(self) -> Vec<Update> {
        let verdict = match self.query().await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(entity = %self.target, error = %e, "CrowdSec lookup failed");
                return Vec::new();
            }
        };

        tracing::info!(entity = %self.target, status = verdict, "CrowdSec lookup finished");
        match Update::new(STATUS_METRIC, verdict) {
            Ok(update) => vec![update],
            Err(e) => {
                tracing::warn!(metric = STATUS_METRIC, error = %e, "Omitting invalid metric");
                Vec::new()
            }
        }
    }
}
