//! Configuration types for clusterset-dns.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DNS server configuration.
    pub dns: DnsConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// DNS server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Address for the DNS server to listen on (UDP and TCP).
    pub listen_addr: SocketAddr,

    /// Zone suffixes served authoritatively. Queries outside every zone
    /// are answered NOTZONE (or delegated, see `fallthrough`).
    #[serde(default = "default_zones")]
    pub zones: Vec<String>,

    /// Zones under which unanswerable queries (out of zone, pod
    /// subtree, unknown service) delegate to the next handler instead
    /// of erroring. May cover zones outside `zones`.
    #[serde(default, rename = "fallthrough")]
    pub fallthrough_zones: Vec<String>,

    /// TTL in seconds applied to every synthesised record.
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl DnsConfig {
    /// Configuration for one served zone with library defaults, used by
    /// tests and embedders that wire the handler directly.
    pub fn for_zone(zone: &str) -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5353)),
            zones: vec![zone.to_string()],
            fallthrough_zones: Vec::new(),
            ttl: default_ttl(),
        }
    }
}

fn default_zones() -> Vec<String> {
    vec!["clusterset.local.".to_string()]
}

fn default_ttl() -> u32 {
    5
}

/// Normalise a zone suffix to canonical form: lowercase, trailing dot.
pub fn normalize_zone(zone: &str) -> String {
    let mut normalized = zone.trim_end_matches('.').to_ascii_lowercase();
    normalized.push('.');
    normalized
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g. "info", "clusterset_dns=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
