//! Service-import store: the logical services exported into the cluster
//! set, keyed by namespace and name with one contribution per source
//! cluster.
//!
//! The store is written by external controllers watching the federation
//! control plane and read by the query path. Readers always take a
//! cloned snapshot of a key's contributions under the read lock, so a
//! query never observes a torn record.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

use crate::record::{ServicePort, ServiceType};

/// One cluster's contribution to an imported service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceImport {
    /// Namespace of the exported service.
    pub namespace: String,
    /// Service name.
    pub name: String,
    /// Cluster exporting this contribution.
    pub cluster_id: String,
    /// Exposition type of this contribution.
    pub service_type: ServiceType,
    /// Service VIP; `None` for headless contributions.
    pub ip: Option<IpAddr>,
    /// Ports exposed by this contribution.
    pub ports: Vec<ServicePort>,
}

/// Thread-safe map of imported services. Cheap to clone; all clones
/// share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct ImportMap {
    inner: Arc<RwLock<HashMap<String, Vec<ServiceImport>>>>,
}

fn key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

impl ImportMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cluster's contribution to a service.
    pub fn put(&self, import: ServiceImport) {
        let mut inner = self.inner.write();
        debug!(
            namespace = %import.namespace,
            service = %import.name,
            cluster = %import.cluster_id,
            service_type = ?import.service_type,
            "upserting service import"
        );

        let contributions = inner.entry(key(&import.namespace, &import.name)).or_default();
        match contributions
            .iter_mut()
            .find(|c| c.cluster_id == import.cluster_id)
        {
            Some(existing) => *existing = import,
            None => contributions.push(import),
        }
    }

    /// Remove a cluster's contribution. The service entry is dropped
    /// when its last contribution goes away.
    pub fn remove(&self, namespace: &str, name: &str, cluster_id: &str) {
        let mut inner = self.inner.write();
        let k = key(namespace, name);
        if let Some(contributions) = inner.get_mut(&k) {
            contributions.retain(|c| c.cluster_id != cluster_id);
            debug!(namespace, service = name, cluster = cluster_id, "removed service import");
            if contributions.is_empty() {
                inner.remove(&k);
            }
        }
    }

    /// Snapshot of all contributions for a service. Contributions keep
    /// their insertion order, so repeated queries over an unchanged map
    /// see the same ordering.
    pub fn get(&self, namespace: &str, name: &str) -> Option<Vec<ServiceImport>> {
        self.inner.read().get(&key(namespace, name)).cloned()
    }

    /// Number of known services (for metrics).
    pub fn services_count(&self) -> usize {
        self.inner.read().len()
    }
}
