//! Resource-record synthesis.
//!
//! Builders take the selected records plus the parsed query and emit
//! hickory `Record`s. The owner of every answer is the query name
//! exactly as the client sent it, so cluster, port and underscore
//! prefixes are echoed verbatim.

use hickory_proto::rr::rdata::{A, AAAA, SRV};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use std::net::IpAddr;
use tracing::warn;

use crate::parse::ParsedQuery;
use crate::record::{DnsRecord, ServicePort};

/// SRV priority for every synthesised record.
const SRV_PRIORITY: u16 = 0;
/// SRV weight for every synthesised record.
const SRV_WEIGHT: u16 = 50;

/// Build A or AAAA answers for the records whose address family matches
/// `rtype`. A family mismatch yields no records, which the handler
/// reports as NODATA.
pub fn build_address_records(
    query: &ParsedQuery,
    records: &[DnsRecord],
    rtype: RecordType,
    ttl: u32,
) -> Vec<Record> {
    records
        .iter()
        .filter_map(|record| {
            let rdata = match (rtype, record.ip) {
                (RecordType::A, IpAddr::V4(ip)) => RData::A(A::from(ip)),
                (RecordType::AAAA, IpAddr::V6(ip)) => RData::AAAA(AAAA::from(ip)),
                _ => return None,
            };
            Some(make_record(query.qname.clone(), ttl, rdata))
        })
        .collect()
}

/// Build SRV answers: one record per selected record and surviving
/// port, `priority 0 weight 50 port <n> target <owner>`.
pub fn build_srv_records(query: &ParsedQuery, records: &[DnsRecord], ttl: u32) -> Vec<Record> {
    let mut answers = Vec::new();

    for record in records {
        let ports: Vec<&ServicePort> = match &query.port {
            Some(selector) => record
                .ports
                .iter()
                .filter(|p| p.matches(&selector.name, &selector.protocol))
                .collect(),
            None => record.ports.iter().collect(),
        };
        if ports.is_empty() {
            continue;
        }

        let target = match srv_target(query, record) {
            Ok(target) => target,
            Err(error) => {
                warn!(%error, cluster = %record.cluster_id, "skipping record with unusable SRV target");
                continue;
            }
        };

        for port in ports {
            answers.push(make_record(
                query.qname.clone(),
                ttl,
                RData::SRV(SRV::new(SRV_PRIORITY, SRV_WEIGHT, port.port, target.clone())),
            ));
        }
    }

    answers
}

/// SRV target for one selected record.
///
/// Headless endpoints resolve through their per-cluster host owner;
/// VIP-backed services resolve through the service name, scoped to the
/// cluster when the query named one.
fn srv_target(query: &ParsedQuery, record: &DnsRecord) -> Result<Name, hickory_proto::ProtoError> {
    let base = query.service_fqdn();
    let target = match &record.host_owner {
        Some(owner) => format!("{owner}.{base}"),
        None if query.cluster.is_some() => format!("{}.{base}", record.cluster_id),
        None => base,
    };
    Name::from_ascii(target)
}

fn make_record(name: Name, ttl: u32, rdata: RData) -> Record {
    let mut record = Record::from_rdata(name, ttl, rdata);
    record.set_dns_class(DNSClass::IN);
    record
}
