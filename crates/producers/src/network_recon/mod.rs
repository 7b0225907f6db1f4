//! Network reconnaissance producer backed by the `nmap` binary.
//!
//! Runs `nmap <args> -oX - <address>` as a child process, parses the XML
//! report from stdout and turns it into updates. The child is spawned with
//! `kill_on_drop(true)`, so dropping the scan future (for example when a
//! deadline expires) kills nmap and releases its sockets.

pub mod report;

use std::process::Stdio;
use std::time::Instant;

use paranoia_core::entity::Target;
use paranoia_core::update::Update;
use paranoia_core::validate::{validate_source, IdentifierKind, Source};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::{ProducerError, ScanError};
use crate::producer::Producer;

/// Source name recorded on every nmap update.
pub const SOURCE: &str = "Nmap Scanner";

/// Maximum stdout or stderr captured from nmap (10 MiB).
const MAX_OUTPUT_BYTES: u64 = 10 * 1024 * 1024;

/// How nmap is invoked.
#[derive(Debug, Clone)]
pub struct NmapSettings {
    /// Program to execute (default: `nmap` on `PATH`).
    pub program: String,
    /// Extra arguments placed before `-oX - <address>` (default: `-F -O`).
    pub args: Vec<String>,
}

impl Default for NmapSettings {
    fn default() -> Self {
        Self {
            program: "nmap".to_string(),
            args: vec!["-F".to_string(), "-O".to_string()],
        }
    }
}

impl NmapSettings {
    /// Split a whitespace-separated argument string such as `"-F -O"`.
    pub fn split_args(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(str::to_string).collect()
    }
}

/// Scans one host or website with nmap.
#[derive(Debug)]
pub struct NetworkReconProducer {
    source: Source,
    target: Target,
    address: String,
    settings: NmapSettings,
}

impl NetworkReconProducer {
    pub fn new(target: Target, settings: NmapSettings) -> Result<Self, ProducerError> {
        let address = scan_address(&target).ok_or_else(|| ProducerError::UnsupportedTarget {
            producer: SOURCE,
            identifier: target.identifier.to_string(),
            entity_type: target.entity_type,
            reason: "URL has no host component",
        })?;

        Ok(Self {
            source: validate_source(SOURCE)?,
            target,
            address,
            settings,
        })
    }

    /// Address handed to nmap: the identifier itself, or a URL's host.
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn run(&self) -> Result<Vec<Update>, ScanError> {
        let started = Instant::now();
        let xml = self.run_nmap().await?;
        let report = report::parse(&xml)?;
        let updates = report::extract_updates(&report, &self.address);

        tracing::info!(
            entity = %self.target,
            updates = updates.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "nmap scan finished"
        );
        Ok(updates)
    }

    async fn run_nmap(&self) -> Result<String, ScanError> {
        let mut cmd = Command::new(&self.settings.program);
        cmd.args(&self.settings.args);
        if self.target.identifier.kind() == IdentifierKind::Ipv6 {
            cmd.arg("-6");
        }
        cmd.args(["-oX", "-", self.address.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ScanError::Spawn {
            program: self.settings.program.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (status, stdout, stderr) =
            tokio::join!(child.wait(), read_stream(stdout), read_stream(stderr));

        let status = status.map_err(|source| ScanError::Spawn {
            program: self.settings.program.clone(),
            source,
        })?;

        if !status.success() {
            return Err(ScanError::ExitStatus {
                program: self.settings.program.clone(),
                code: status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl Producer for NetworkReconProducer {
    fn source(&self) -> &Source {
        &self.source
    }

    fn target(&self) -> &Target {
        &self.target
    }

    async fn scan(self) -> Vec<Update> {
        match self.run().await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::error!(entity = %self.target, error = %e, "nmap scan failed");
                Vec::new()
            }
        }
    }
}

/// Address nmap should scan for `target`, or `None` for a URL without a host.
fn scan_address(target: &Target) -> Option<String> {
    let identifier = target.identifier.as_str();
    if !identifier.contains("://") {
        return Some(identifier.to_string());
    }
    let url = reqwest::Url::parse(identifier).ok()?;
    url.host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
}

/// Read an entire output stream, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(identifier: &str, entity_type: &str) -> Target {
        Target::new(identifier, entity_type).unwrap()
    }

    #[test]
    fn address_is_identifier_or_url_host() {
        let ip = NetworkReconProducer::new(target("10.0.0.1", "host"), NmapSettings::default())
            .unwrap();
        assert_eq!(ip.address(), "10.0.0.1");

        let site = NetworkReconProducer::new(
            target("https://www.example.com/login", "website"),
            NmapSettings::default(),
        )
        .unwrap();
        assert_eq!(site.address(), "www.example.com");
        assert_eq!(site.source().as_str(), SOURCE);
    }

    #[test]
    fn split_args_ignores_extra_whitespace() {
        assert_eq!(
            NmapSettings::split_args("  -F   -O --max-retries 2 "),
            vec!["-F", "-O", "--max-retries", "2"]
        );
        assert!(NmapSettings::split_args("").is_empty());
    }

    #[tokio::test]
    async fn missing_binary_yields_no_updates() {
        let settings = NmapSettings {
            program: "/nonexistent/nmap".to_string(),
            args: vec![],
        };
        let producer = NetworkReconProducer::new(target("10.0.0.1", "host"), settings).unwrap();
        assert!(producer.scan().await.is_empty());
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let settings = NmapSettings {
            program: "/nonexistent/nmap".to_string(),
            args: vec![],
        };
        let producer = NetworkReconProducer::new(target("10.0.0.1", "host"), settings).unwrap();
        assert!(matches!(producer.run().await, Err(ScanError::Spawn { .. })));
    }
}
