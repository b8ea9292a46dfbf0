//! Record types shared by the stores, the selection policy and the
//! record builders.

use std::net::IpAddr;

/// How a cluster exposes an imported service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    /// Backed by a stable virtual IP in the contributing cluster.
    ClusterSetIp,
    /// No virtual IP; addresses come from endpoint slices.
    Headless,
    /// Any other exposition; skipped by selection.
    Unspecified,
}

/// A named service port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePort {
    /// Port name (e.g. "http").
    pub name: String,
    /// Wire protocol as spelled in the service spec (e.g. "TCP", "UDP").
    pub protocol: String,
    /// Port number.
    pub port: u16,
}

impl ServicePort {
    /// Create a port entry.
    pub fn new(name: &str, protocol: &str, port: u16) -> Self {
        Self {
            name: name.to_string(),
            protocol: protocol.to_string(),
            port,
        }
    }

    /// Whether this port matches a port/protocol sub-query. DNS labels
    /// are case-insensitive, so both sides compare ignoring ASCII case.
    pub fn matches(&self, name: &str, protocol: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) && self.protocol.eq_ignore_ascii_case(protocol)
    }
}

/// One selected answer source: a single address with its port set and
/// owning cluster.
///
/// `host_owner` carries the per-endpoint target prefix for headless
/// services (`<hostname>.<cluster>`, or the address text when the
/// endpoint has no hostname). VIP-backed services leave it `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Address answered for A/AAAA queries.
    pub ip: IpAddr,
    /// Headless host-owner prefix for SRV targets.
    pub host_owner: Option<String>,
    /// Ports offered by this record.
    pub ports: Vec<ServicePort>,
    /// Cluster that owns the address.
    pub cluster_id: String,
}

impl DnsRecord {
    /// Record for a VIP-backed service contribution.
    pub fn cluster_ip(ip: IpAddr, ports: Vec<ServicePort>, cluster_id: &str) -> Self {
        Self {
            ip,
            host_owner: None,
            ports,
            cluster_id: cluster_id.to_string(),
        }
    }
}
