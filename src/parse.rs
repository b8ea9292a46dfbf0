//! Query-name parsing for the cluster-set zone.
//!
//! Recognised forms under a served zone (for example `clusterset.local.`):
//!
//! - `<service>.<namespace>.svc.<zone>` — bare service query
//! - `<cluster>.<service>.<namespace>.svc.<zone>` — one cluster only
//! - `<port>.<protocol>.<service>.<namespace>.svc.<zone>` — port and
//!   protocol sub-query, with or without RFC 2782 underscore prefixes
//! - `<service>.<namespace>.pod.<zone>` — pod subtree, not served
//!
//! Label matching is case-insensitive; the original query name is kept
//! alongside the parsed form so answers echo it byte-for-byte.

use hickory_proto::rr::Name;

/// Port-and-protocol sub-query prefix, underscores stripped and labels
/// lowercased for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSelector {
    /// Port name to match.
    pub name: String,
    /// Protocol label to match.
    pub protocol: String,
}

/// A classified query name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Query name exactly as the client sent it, echoed into answers.
    pub qname: Name,
    /// Matched zone suffix, canonical lowercase with trailing dot.
    pub zone: String,
    /// Namespace label.
    pub namespace: String,
    /// Service label.
    pub service: String,
    /// Cluster restriction, when the name carried a cluster prefix.
    pub cluster: Option<String>,
    /// Port restriction, when the name carried a port/protocol prefix.
    pub port: Option<PortSelector>,
}

impl ParsedQuery {
    /// Canonical `<service>.<namespace>.svc.<zone>` name used as the
    /// base of SRV targets.
    pub fn service_fqdn(&self) -> String {
        format!("{}.{}.svc.{}", self.service, self.namespace, self.zone)
    }
}

/// Why a name under a served zone could not be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The name addresses the `pod` subtree, which is not served.
    PodQuery,
    /// The name does not follow the service grammar.
    Invalid,
}

/// Longest configured zone that is a suffix of `name`. Both sides must
/// be lowercase with a trailing dot.
pub fn match_zone<'a>(name: &str, zones: &'a [String]) -> Option<&'a str> {
    zones
        .iter()
        .filter(|zone| is_sub_domain(zone, name))
        .max_by_key(|zone| zone.len())
        .map(String::as_str)
}

/// Whether `name` equals `zone` or sits under it on a label boundary.
pub fn is_sub_domain(zone: &str, name: &str) -> bool {
    name == zone
        || (name.len() > zone.len()
            && name.ends_with(zone)
            && name.as_bytes()[name.len() - zone.len() - 1] == b'.')
}

/// Parse a query name against the zone suffix it matched.
pub fn parse_query(qname: &Name, zone: &str) -> Result<ParsedQuery, ParseError> {
    let total = qname.iter().count();
    let zone_labels = zone.trim_matches('.').split('.').count();
    let prefix_len = total.checked_sub(zone_labels).ok_or(ParseError::Invalid)?;

    // Prefix labels, most specific first, lowercased for matching.
    let labels: Vec<String> = qname
        .iter()
        .take(prefix_len)
        .map(|label| String::from_utf8_lossy(label).to_ascii_lowercase())
        .collect();

    // The two labels adjacent to the zone must be <namespace>.<svc|pod>.
    if labels.len() < 3 {
        return Err(ParseError::Invalid);
    }
    match labels[labels.len() - 1].as_str() {
        "svc" => {}
        "pod" => return Err(ParseError::PodQuery),
        _ => return Err(ParseError::Invalid),
    }
    let namespace = labels[labels.len() - 2].clone();

    let (service, cluster, port) = match &labels[..labels.len() - 2] {
        [service] => (service.clone(), None, None),
        [cluster, service] => (service.clone(), Some(cluster.clone()), None),
        [port, protocol, service] => (
            service.clone(),
            None,
            Some(PortSelector {
                name: strip_underscore(port),
                protocol: strip_underscore(protocol),
            }),
        ),
        _ => return Err(ParseError::Invalid),
    };

    Ok(ParsedQuery {
        qname: qname.clone(),
        zone: zone.to_string(),
        namespace,
        service,
        cluster,
        port,
    })
}

fn strip_underscore(label: &str) -> String {
    label.strip_prefix('_').unwrap_or(label).to_string()
}
