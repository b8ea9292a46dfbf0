//! Index of services hosted in the local cluster, used for the
//! local-preference policy.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::record::DnsRecord;

/// Lookup for services the local cluster hosts itself.
pub trait LocalServices: Send + Sync {
    /// DNS record for a locally hosted service, if any.
    fn get(&self, name: &str, namespace: &str) -> Option<DnsRecord>;
}

/// In-memory [`LocalServices`] implementation, populated by the local
/// service controller. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct LocalServiceMap {
    inner: Arc<RwLock<HashMap<String, DnsRecord>>>,
}

fn key(name: &str, namespace: &str) -> String {
    format!("{namespace}/{name}")
}

impl LocalServiceMap {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for a local service.
    pub fn put(&self, name: &str, namespace: &str, record: DnsRecord) {
        debug!(namespace, service = name, ip = %record.ip, "upserting local service");
        self.inner.write().insert(key(name, namespace), record);
    }

    /// Remove a local service.
    pub fn remove(&self, name: &str, namespace: &str) {
        if self.inner.write().remove(&key(name, namespace)).is_some() {
            debug!(namespace, service = name, "removed local service");
        }
    }

    /// Number of local entries (for metrics).
    pub fn entries_count(&self) -> usize {
        self.inner.read().len()
    }
}

impl LocalServices for LocalServiceMap {
    fn get(&self, name: &str, namespace: &str) -> Option<DnsRecord> {
        self.inner.read().get(&key(name, namespace)).cloned()
    }
}
