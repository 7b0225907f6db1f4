//! nmap XML report (`-oX`) model and metric extraction.
//!
//! Only the parts of the report that feed metrics are modelled; everything
//! else in the document is skipped by the deserializer.

use std::collections::BTreeSet;

use paranoia_core::update::Update;
use serde::Deserialize;

use crate::error::ScanError;

/// Transport families whose open ports are reported.
const PORT_FAMILIES: [&str; 4] = ["ip", "sctp", "tcp", "udp"];

/// `Open Ports` value for a host with nothing open. Always sent, so an old
/// port list never outlives a count of zero.
pub const NO_OPEN_PORTS: &str = "none";

#[derive(Debug, Deserialize)]
pub struct NmapRun {
    #[serde(default, rename = "host")]
    pub hosts: Vec<Host>,
    pub runstats: Option<RunStats>,
}

#[derive(Debug, Deserialize)]
pub struct RunStats {
    pub finished: Option<Finished>,
}

#[derive(Debug, Deserialize)]
pub struct Finished {
    #[serde(rename = "@elapsed")]
    pub elapsed: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    pub status: Option<Status>,
    #[serde(default, rename = "address")]
    pub addresses: Vec<Address>,
    pub hostnames: Option<Hostnames>,
    pub ports: Option<Ports>,
    pub os: Option<Os>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct Address {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addrtype: Option<String>,
    #[serde(rename = "@vendor")]
    pub vendor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Hostnames {
    #[serde(default, rename = "hostname")]
    pub entries: Vec<Hostname>,
}

#[derive(Debug, Deserialize)]
pub struct Hostname {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Ports {
    #[serde(default, rename = "port")]
    pub entries: Vec<Port>,
}

#[derive(Debug, Deserialize)]
pub struct Port {
    #[serde(rename = "@protocol")]
    pub protocol: String,
    #[serde(rename = "@portid")]
    pub portid: u16,
    pub state: PortState,
}

#[derive(Debug, Deserialize)]
pub struct PortState {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Os {
    #[serde(default, rename = "osmatch")]
    pub matches: Vec<OsMatch>,
}

#[derive(Debug, Deserialize)]
pub struct OsMatch {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(default, rename = "osclass")]
    pub classes: Vec<OsClass>,
}

#[derive(Debug, Deserialize)]
pub struct OsClass {
    #[serde(rename = "@type")]
    pub device_type: Option<String>,
    #[serde(rename = "@vendor")]
    pub vendor: Option<String>,
    #[serde(rename = "@osfamily")]
    pub os_family: Option<String>,
}

/// Parse a complete `-oX` document.
pub fn parse(xml: &str) -> Result<NmapRun, ScanError> {
    Ok(quick_xml::de::from_str(xml)?)
}

impl NmapRun {
    /// The host entry for `address`, or the first host when none matches
    /// (hostname targets are reported by resolved address).
    pub fn host_for(&self, address: &str) -> Option<&Host> {
        self.hosts
            .iter()
            .find(|h| h.addresses.iter().any(|a| a.addr.eq_ignore_ascii_case(address)))
            .or_else(|| self.hosts.first())
    }

    pub fn elapsed(&self) -> Option<&str> {
        self.runstats
            .as_ref()?
            .finished
            .as_ref()?
            .elapsed
            .as_deref()
    }
}

impl Host {
    pub fn state(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.state.as_str())
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostnames
            .as_ref()?
            .entries
            .first()
            .map(|h| h.name.as_str())
    }

    fn best_match(&self) -> Option<&OsMatch> {
        self.os.as_ref()?.matches.first()
    }

    fn best_class(&self) -> Option<&OsClass> {
        self.best_match()?.classes.first()
    }

    pub fn device(&self) -> Option<&str> {
        self.best_match().map(|m| m.name.as_str())
    }

    /// OS vendor from fingerprinting, falling back to the MAC address vendor.
    pub fn vendor(&self) -> Option<&str> {
        self.best_class()
            .and_then(|c| c.vendor.as_deref())
            .or_else(|| self.addresses.iter().find_map(|a| a.vendor.as_deref()))
    }

    pub fn device_type(&self) -> Option<&str> {
        self.best_class()?.device_type.as_deref()
    }

    pub fn os_family(&self) -> Option<&str> {
        self.best_class()?.os_family.as_deref()
    }

    /// Distinct open port numbers across every transport family, ascending.
    pub fn open_ports(&self) -> Vec<u16> {
        let Some(ports) = &self.ports else {
            return Vec::new();
        };

        let mut open = BTreeSet::new();
        for family in PORT_FAMILIES {
            open.extend(
                ports
                    .entries
                    .iter()
                    .filter(|p| p.protocol == family && p.state.state == "open")
                    .map(|p| p.portid),
            );
        }
        open.into_iter().collect()
    }
}

/// Turn a parsed report into updates for the host at `address`.
///
/// A metric whose data is missing or fails validation is logged and left
/// out; the rest are still returned. A report without any host entry means
/// nmap saw the target as down.
pub fn extract_updates(report: &NmapRun, address: &str) -> Vec<Update> {
    let mut updates = Vec::new();
    let mut push = |metric: &str, value: Option<String>| match value {
        Some(value) => match Update::new(metric, &value) {
            Ok(update) => updates.push(update),
            Err(e) => tracing::warn!(metric, error = %e, "Omitting invalid nmap metric"),
        },
        None => tracing::debug!(metric, address, "nmap report has no data for metric"),
    };

    push("Elapsed Time", report.elapsed().map(str::to_string));

    match report.host_for(address) {
        None => push("State", Some("down".to_string())),
        Some(host) => {
            let open_ports = host.open_ports();
            let joined = if open_ports.is_empty() {
                NO_OPEN_PORTS.to_string()
            } else {
                open_ports
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            };

            push("State", host.state().map(str::to_string));
            push("Hostname", host.hostname().map(str::to_string));
            push("Device", host.device().map(str::to_string));
            push("Vendor", host.vendor().map(str::to_string));
            push("Device Type", host.device_type().map(str::to_string));
            push("OS Family", host.os_family().map(str::to_string));
            push("Open Port Count", Some(open_ports.len().to_string()));
            push("Open Ports", Some(joined));
        }
    }

    updates
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const SAMPLE: &str = include_str!("../../tests/fixtures/nmap_host_up.xml");

    fn value_of<'a>(updates: &'a [Update], metric: &str) -> Option<&'a str> {
        updates.iter().find(|u| u.metric() == metric).map(Update::value)
    }

    #[test]
    fn sample_report_yields_all_metrics() {
        let report = parse(SAMPLE).unwrap();
        let updates = extract_updates(&report, "10.0.0.1");

        assert_eq!(value_of(&updates, "State"), Some("up"));
        assert_eq!(value_of(&updates, "Hostname"), Some("gateway.lan"));
        assert_eq!(value_of(&updates, "Elapsed Time"), Some("2.35"));
        assert_eq!(value_of(&updates, "Device"), Some("Linux 4.15 - 5.8"));
        assert_eq!(value_of(&updates, "Vendor"), Some("Linux"));
        assert_eq!(value_of(&updates, "Device Type"), Some("general purpose"));
        assert_eq!(value_of(&updates, "OS Family"), Some("Linux"));
        assert_eq!(value_of(&updates, "Open Port Count"), Some("3"));
        assert_eq!(value_of(&updates, "Open Ports"), Some("22,53,80"));
        assert_eq!(updates.len(), 9);
    }

    #[test]
    fn open_ports_merge_families_and_skip_non_open() {
        let report = parse(SAMPLE).unwrap();
        let host = report.host_for("10.0.0.1").unwrap();
        assert_eq!(host.open_ports(), vec![22, 53, 80]);
    }

    #[test]
    fn vendor_falls_back_to_mac_vendor() {
        let xml = r#"<nmaprun>
<host><status state="up"/>
<address addr="10.0.0.7" addrtype="ipv4"/>
<address addr="00:11:22:33:44:55" addrtype="mac" vendor="Raspberry Pi Foundation"/>
<hostnames/>
</host>
</nmaprun>"#;
        let report = parse(xml).unwrap();
        let updates = extract_updates(&report, "10.0.0.7");

        assert_eq!(value_of(&updates, "Vendor"), Some("Raspberry Pi Foundation"));
        assert_eq!(value_of(&updates, "State"), Some("up"));
        assert_eq!(value_of(&updates, "Open Port Count"), Some("0"));
        assert_eq!(value_of(&updates, "Open Ports"), Some(NO_OPEN_PORTS));
        // No data: omitted rather than emitted empty.
        assert_eq!(value_of(&updates, "Hostname"), None);
        assert_eq!(value_of(&updates, "Device"), None);
        assert_eq!(value_of(&updates, "Elapsed Time"), None);
    }

    #[test]
    fn report_without_host_is_down() {
        let xml = r#"<nmaprun>
<runstats><finished elapsed="3.01" exit="success"/><hosts up="0" down="1" total="1"/></runstats>
</nmaprun>"#;
        let report = parse(xml).unwrap();
        let updates = extract_updates(&report, "10.0.0.9");

        assert_eq!(value_of(&updates, "State"), Some("down"));
        assert_eq!(value_of(&updates, "Elapsed Time"), Some("3.01"));
        assert_eq!(updates.len(), 2);
    }

    #[test]
    fn host_is_chosen_by_address() {
        let xml = r#"<nmaprun>
<host><status state="down"/><address addr="10.0.0.1" addrtype="ipv4"/></host>
<host><status state="up"/><address addr="10.0.0.2" addrtype="ipv4"/></host>
</nmaprun>"#;
        let report = parse(xml).unwrap();
        assert_eq!(report.host_for("10.0.0.2").unwrap().state(), Some("up"));
        // Unknown address (e.g. a hostname target) falls back to the first host.
        assert_eq!(report.host_for("example.com").unwrap().state(), Some("down"));
    }

    #[test]
    fn malformed_report_is_an_error() {
        assert_matches!(parse("<nmaprun><host>"), Err(ScanError::Report(_)));
    }
}
