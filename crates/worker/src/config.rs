use std::time::Duration;

use paranoia_core::entity::EntityType;
use paranoia_producers::{CrowdsecSettings, NmapSettings, ProducerKind, ProducerSettings};

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the Paranoia API (default: `http://127.0.0.1:8000`).
    pub api_url: String,
    /// Producers run against every target (default: all).
    pub producers: Vec<ProducerKind>,
    /// Entity type whose identifiers are scanned (default: `host`).
    pub scan_entity_type: EntityType,
    /// Time between scan rounds (default: 1 hour).
    pub scan_interval: Duration,
    /// Deadline for a single producer scan (default: 10 minutes).
    pub scan_deadline: Duration,
    /// Scans running at once (default: `4`).
    pub scan_concurrency: usize,
    /// Producer construction settings.
    pub producer_settings: ProducerSettings,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                    |
    /// |----------------------|----------------------------|
    /// | `PARANOIA_API_URL`   | `http://127.0.0.1:8000`    |
    /// | `PRODUCERS`          | `network_recon,reputation` |
    /// | `SCAN_ENTITY_TYPE`   | `host`                     |
    /// | `SCAN_INTERVAL_SECS` | `3600`                     |
    /// | `SCAN_DEADLINE_SECS` | `600`                      |
    /// | `SCAN_CONCURRENCY`   | `4`                        |
    /// | `NMAP_PATH`          | `nmap`                     |
    /// | `NMAP_ARGS`          | `-F -O`                    |
    /// | `CROWDSEC_LAPI_URL`  | unset                      |
    /// | `CROWDSEC_LAPI_KEY`  | unset                      |
    pub fn from_env() -> Self {
        let api_url = std::env::var("PARANOIA_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".into())
            .trim_end_matches('/')
            .to_string();

        let producers = ProducerKind::parse_list(
            &std::env::var("PRODUCERS").unwrap_or_else(|_| "network_recon,reputation".into()),
        )
        .expect("PRODUCERS must be a comma-separated list of known producers");

        let scan_entity_type = EntityType::parse(
            &std::env::var("SCAN_ENTITY_TYPE").unwrap_or_else(|_| "host".into()),
        )
        .expect("SCAN_ENTITY_TYPE must be 'host' or 'website'");

        let scan_interval_secs: u64 = std::env::var("SCAN_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SCAN_INTERVAL_SECS must be a valid u64");

        let scan_deadline_secs: u64 = std::env::var("SCAN_DEADLINE_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("SCAN_DEADLINE_SECS must be a valid u64");

        let scan_concurrency: usize = std::env::var("SCAN_CONCURRENCY")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("SCAN_CONCURRENCY must be a valid usize");

        let nmap = NmapSettings {
            program: std::env::var("NMAP_PATH").unwrap_or_else(|_| "nmap".into()),
            args: NmapSettings::split_args(
                &std::env::var("NMAP_ARGS").unwrap_or_else(|_| "-F -O".into()),
            ),
        };

        let crowdsec = CrowdsecSettings {
            lapi_url: std::env::var("CROWDSEC_LAPI_URL").ok(),
            lapi_key: std::env::var("CROWDSEC_LAPI_KEY").ok(),
        };

        Self {
            api_url,
            producers,
            scan_entity_type,
            scan_interval: Duration::from_secs(scan_interval_secs.max(1)),
            scan_deadline: Duration::from_secs(scan_deadline_secs.max(1)),
            scan_concurrency: scan_concurrency.max(1),
            producer_settings: ProducerSettings { nmap, crowdsec },
        }
    }
}
