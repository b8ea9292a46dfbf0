//! Cross-cluster answer selection.
//!
//! Applies, in order: existence, per-contribution type dispatch, cluster
//! restriction, local preference, connectivity and endpoint-health
//! filtering, then materialisation into address records. The result is
//! deterministic for a fixed store state: the local cluster answers
//! alone while it is usable, and remote contributions keep their store
//! order otherwise.

use tracing::trace;

use crate::endpoints::EndpointSliceMap;
use crate::imports::{ImportMap, ServiceImport};
use crate::local::LocalServices;
use crate::parse::ParsedQuery;
use crate::record::{DnsRecord, ServiceType};
use crate::status::{ClusterStatus, EndpointsStatus};

/// Borrowed view over the stores and oracles for one query.
pub struct Selector<'a> {
    /// Service-import store.
    pub imports: &'a ImportMap,
    /// Endpoint-slice store.
    pub endpoints: &'a EndpointSliceMap,
    /// Local-services index.
    pub local_services: &'a dyn LocalServices,
    /// Cluster-connectivity oracle.
    pub cluster_status: &'a dyn ClusterStatus,
    /// Endpoint-health oracle.
    pub endpoints_status: &'a dyn EndpointsStatus,
}

impl Selector<'_> {
    /// Resolve a parsed query to its answer records.
    ///
    /// `None` means the service is unknown (NXDOMAIN); `Some(vec![])`
    /// means it exists but nothing currently answers (NODATA).
    pub fn select(&self, query: &ParsedQuery) -> Option<Vec<DnsRecord>> {
        let contributions = self.imports.get(&query.namespace, &query.service)?;
        let valid: Vec<ServiceImport> = contributions
            .into_iter()
            .filter(|c| {
                matches!(
                    c.service_type,
                    ServiceType::ClusterSetIp | ServiceType::Headless
                )
            })
            .collect();

        // A service whose every contribution is of an unknown type is
        // indistinguishable from an absent one.
        if valid.is_empty() {
            trace!(
                namespace = %query.namespace,
                service = %query.service,
                "no contribution of a served type"
            );
            return None;
        }

        let records = match &query.cluster {
            Some(cluster) => self.select_cluster(query, cluster, &valid),
            None => self.select_any(query, &valid),
        };
        Some(records)
    }

    /// The client named a cluster: answer from it alone and skip the
    /// connectivity filter.
    fn select_cluster(
        &self,
        query: &ParsedQuery,
        cluster: &str,
        contributions: &[ServiceImport],
    ) -> Vec<DnsRecord> {
        // The local index is authoritative for the local cluster's
        // service IP and port set.
        if let Some(local) = self.cluster_status.local_cluster_id() {
            if local.eq_ignore_ascii_case(cluster) {
                if let Some(record) = self.local_services.get(&query.service, &query.namespace) {
                    return vec![record];
                }
            }
        }

        contributions
            .iter()
            .filter(|c| c.cluster_id.eq_ignore_ascii_case(cluster))
            .flat_map(|c| self.materialise(query, c))
            .collect()
    }

    fn select_any(&self, query: &ParsedQuery, contributions: &[ServiceImport]) -> Vec<DnsRecord> {
        if let Some(record) = self.local_record(query) {
            trace!(
                namespace = %query.namespace,
                service = %query.service,
                cluster = %record.cluster_id,
                "serving local cluster"
            );
            return vec![record];
        }

        contributions
            .iter()
            .filter(|c| self.cluster_status.is_connected(&c.cluster_id))
            .flat_map(|c| self.materialise(query, c))
            .collect()
    }

    /// Local-preference gate: the local cluster answers alone while it
    /// hosts the service and is connected. Endpoint health is a
    /// headless concern; a local VIP is treated as stable.
    fn local_record(&self, query: &ParsedQuery) -> Option<DnsRecord> {
        let local = self.cluster_status.local_cluster_id()?;
        let record = self.local_services.get(&query.service, &query.namespace)?;

        self.cluster_status.is_connected(&local).then_some(record)
    }

    /// Turn one contribution into zero or more answer records.
    fn materialise(&self, query: &ParsedQuery, contribution: &ServiceImport) -> Vec<DnsRecord> {
        match contribution.service_type {
            ServiceType::ClusterSetIp => contribution
                .ip
                .map(|ip| {
                    DnsRecord::cluster_ip(ip, contribution.ports.clone(), &contribution.cluster_id)
                })
                .into_iter()
                .collect(),
            ServiceType::Headless => self.headless_records(query, contribution),
            ServiceType::Unspecified => Vec::new(),
        }
    }

    fn headless_records(&self, query: &ParsedQuery, contribution: &ServiceImport) -> Vec<DnsRecord> {
        if !self.endpoints_status.is_healthy(
            &query.service,
            &query.namespace,
            &contribution.cluster_id,
        ) {
            trace!(
                namespace = %query.namespace,
                service = %query.service,
                cluster = %contribution.cluster_id,
                "skipping cluster with unhealthy endpoints"
            );
            return Vec::new();
        }

        let Some(slice) =
            self.endpoints
                .get(&query.namespace, &query.service, &contribution.cluster_id)
        else {
            return Vec::new();
        };

        slice
            .endpoints
            .iter()
            .map(|endpoint| {
                let host_owner = match &endpoint.hostname {
                    Some(hostname) => format!("{hostname}.{}", contribution.cluster_id),
                    None => endpoint.address.to_string(),
                };
                DnsRecord {
                    ip: endpoint.address,
                    host_owner: Some(host_owner),
                    ports: slice.ports.clone(),
                    cluster_id: contribution.cluster_id.clone(),
                }
            })
            .collect()
    }
}
