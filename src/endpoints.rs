//! Endpoint-slice store: per-cluster endpoints for headless services.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

use crate::record::ServicePort;

/// A single endpoint row within a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Pod hostname, when the workload sets one.
    pub hostname: Option<String>,
    /// Endpoint address.
    pub address: IpAddr,
}

/// Endpoints contributed by one cluster for one headless service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSlice {
    /// Namespace of the service.
    pub namespace: String,
    /// Service name.
    pub name: String,
    /// Cluster contributing these endpoints.
    pub cluster_id: String,
    /// Endpoint rows, in the order the controller reported them.
    pub endpoints: Vec<Endpoint>,
    /// Ports shared by every endpoint in the slice.
    pub ports: Vec<ServicePort>,
}

/// Thread-safe map of endpoint slices keyed by namespace, service name
/// and cluster. Cheap to clone; all clones share the underlying map.
#[derive(Debug, Clone, Default)]
pub struct EndpointSliceMap {
    inner: Arc<RwLock<HashMap<String, EndpointSlice>>>,
}

fn key(namespace: &str, name: &str, cluster_id: &str) -> String {
    format!("{namespace}/{name}/{cluster_id}")
}

impl EndpointSliceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cluster's slice for a service.
    pub fn put(&self, slice: EndpointSlice) {
        debug!(
            namespace = %slice.namespace,
            service = %slice.name,
            cluster = %slice.cluster_id,
            endpoints = slice.endpoints.len(),
            "upserting endpoint slice"
        );
        self.inner
            .write()
            .insert(key(&slice.namespace, &slice.name, &slice.cluster_id), slice);
    }

    /// Remove a cluster's slice for a service.
    pub fn remove(&self, namespace: &str, name: &str, cluster_id: &str) {
        if self
            .inner
            .write()
            .remove(&key(namespace, name, cluster_id))
            .is_some()
        {
            debug!(namespace, service = name, cluster = cluster_id, "removed endpoint slice");
        }
    }

    /// Snapshot of one cluster's slice for a service.
    pub fn get(&self, namespace: &str, name: &str, cluster_id: &str) -> Option<EndpointSlice> {
        self.inner.read().get(&key(namespace, name, cluster_id)).cloned()
    }

    /// Number of stored slices (for metrics).
    pub fn slices_count(&self) -> usize {
        self.inner.read().len()
    }
}
