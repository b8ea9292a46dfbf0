//! Cluster-connectivity and endpoint-health oracles.
//!
//! The query path consults these through trait seams; the in-memory
//! implementations here are fed by whatever liveness machinery the
//! deployment runs (gateway probes, endpoint watches).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Connectivity view over the peer clusters in the set.
pub trait ClusterStatus: Send + Sync {
    /// Whether the datapath to a cluster is currently up.
    fn is_connected(&self, cluster_id: &str) -> bool;

    /// Identifier of the cluster this resolver runs in, when known.
    fn local_cluster_id(&self) -> Option<String>;
}

/// Per-service endpoint health, by cluster.
pub trait EndpointsStatus: Send + Sync {
    /// Whether a service has at least one usable endpoint in a cluster.
    fn is_healthy(&self, name: &str, namespace: &str, cluster_id: &str) -> bool;
}

/// In-memory [`ClusterStatus`] implementation. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ClusterStatusMap {
    inner: Arc<RwLock<ClusterStatusInner>>,
}

#[derive(Debug, Default)]
struct ClusterStatusInner {
    connected: HashMap<String, bool>,
    local_cluster_id: Option<String>,
}

impl ClusterStatusMap {
    /// Create an empty status map; every cluster starts disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cluster's connectivity.
    pub fn set_connected(&self, cluster_id: &str, connected: bool) {
        debug!(cluster = cluster_id, connected, "cluster connectivity changed");
        self.inner
            .write()
            .connected
            .insert(cluster_id.to_string(), connected);
    }

    /// Forget a cluster entirely.
    pub fn remove(&self, cluster_id: &str) {
        self.inner.write().connected.remove(cluster_id);
    }

    /// Set the identifier of the cluster this resolver runs in.
    pub fn set_local_cluster_id(&self, cluster_id: &str) {
        self.inner.write().local_cluster_id = Some(cluster_id.to_string());
    }
}

impl ClusterStatus for ClusterStatusMap {
    fn is_connected(&self, cluster_id: &str) -> bool {
        self.inner
            .read()
            .connected
            .get(cluster_id)
            .copied()
            .unwrap_or(false)
    }

    fn local_cluster_id(&self) -> Option<String> {
        self.inner.read().local_cluster_id.clone()
    }
}

/// In-memory [`EndpointsStatus`] implementation keyed by namespace,
/// service and cluster. Cheap to clone. A service with no entry is
/// treated as unhealthy.
#[derive(Debug, Clone, Default)]
pub struct EndpointHealthMap {
    inner: Arc<RwLock<HashMap<String, bool>>>,
}

fn health_key(name: &str, namespace: &str, cluster_id: &str) -> String {
    format!("{namespace}/{name}/{cluster_id}")
}

impl EndpointHealthMap {
    /// Create an empty health map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record whether a service has usable endpoints in a cluster.
    pub fn set_healthy(&self, name: &str, namespace: &str, cluster_id: &str, healthy: bool) {
        debug!(namespace, service = name, cluster = cluster_id, healthy, "endpoint health changed");
        self.inner
            .write()
            .insert(health_key(name, namespace, cluster_id), healthy);
    }

    /// Forget a service's health entry for a cluster.
    pub fn remove(&self, name: &str, namespace: &str, cluster_id: &str) {
        self.inner
            .write()
            .remove(&health_key(name, namespace, cluster_id));
    }
}

impl EndpointsStatus for EndpointHealthMap {
    fn is_healthy(&self, name: &str, namespace: &str, cluster_id: &str) -> bool {
        self.inner
            .read()
            .get(&health_key(name, namespace, cluster_id))
            .copied()
            .unwrap_or(false)
    }
}
