//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the exporter.
//! All types derive Serde traits for deserialization from the JSON config file.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::waze::{Region, Vehicle};

/// Root configuration for the exporter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Address book: short name to free-text address.
    pub addresses: BTreeMap<String, String>,

    /// Directed paths to monitor, in collection order.
    pub paths: Vec<PathSpec>,

    /// Listen address for the metrics endpoint (e.g. ":9091").
    pub listen: String,

    /// Upstream region partition.
    pub region: Region,

    /// Upstream routing profile.
    pub vehicle: Vehicle,

    pub avoid_toll: bool,

    pub avoid_subscription_road: bool,

    pub avoid_ferry: bool,

    /// Delay between two upstream calls of the same cycle, in milliseconds.
    pub sleep: u64,

    /// Upstream origin, without trailing path.
    pub base_url: String,

    /// Per-call HTTP timeout in seconds.
    pub timeout_secs: u64,

    /// Legacy single-path schema: origin endpoint.
    #[serde(skip_serializing)]
    pub from: Option<LegacyEndpoint>,

    /// Legacy single-path schema: destination endpoint.
    #[serde(skip_serializing)]
    pub to: Option<LegacyEndpoint>,

    /// Legacy single-path schema: also collect the reverse direction.
    #[serde(skip_serializing)]
    pub bidirectional: Option<bool>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            addresses: BTreeMap::new(),
            paths: Vec::new(),
            listen: DEFAULT_LISTEN.to_string(),
            region: Region::default(),
            vehicle: Vehicle::default(),
            avoid_toll: false,
            avoid_subscription_road: false,
            avoid_ferry: false,
            sleep: DEFAULT_SLEEP_MS,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            from: None,
            to: None,
            bidirectional: None,
        }
    }
}

pub const DEFAULT_LISTEN: &str = ":9091";
pub const DEFAULT_SLEEP_MS: u64 = 500;
pub const DEFAULT_BASE_URL: &str = "https://www.waze.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl ExporterConfig {
    /// Socket address to bind. A bare `:port` binds all interfaces.
    pub fn listen_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        if self.listen.starts_with(':') {
            format!("0.0.0.0{}", self.listen).parse()
        } else {
            self.listen.parse()
        }
    }
}

/// A directed path between two address-book names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathSpec {
    pub from: String,
    pub to: String,

    /// Also collect the reverse direction.
    #[serde(default)]
    pub bidirectional: bool,
}

impl PathSpec {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            bidirectional: false,
        }
    }

    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }
}

/// Endpoint of the legacy schema: either a name from `addresses`
/// or an inline `{name, address}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LegacyEndpoint {
    Name(String),
    Inline { name: String, address: String },
}
