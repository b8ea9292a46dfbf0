//! DNS server setup and lifecycle management.

use hickory_server::ServerFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::DnsConfig;
use crate::endpoints::EndpointSliceMap;
use crate::error::DnsError;
use crate::handler::ClusterSetDns;
use crate::imports::ImportMap;
use crate::local::LocalServiceMap;
use crate::metrics;
use crate::status::{ClusterStatusMap, EndpointHealthMap};

/// Idle timeout for TCP connections.
const TCP_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval for emitting store-size metrics.
const METRICS_INTERVAL: Duration = Duration::from_secs(10);

/// Periodically emit store-size metrics.
async fn metrics_loop(
    imports: ImportMap,
    endpoints: EndpointSliceMap,
    local_services: LocalServiceMap,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(METRICS_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                metrics::record_store_counts(
                    imports.services_count(),
                    endpoints.slices_count(),
                    local_services.entries_count(),
                );
                debug!(
                    services = imports.services_count(),
                    endpoint_slices = endpoints.slices_count(),
                    local_services = local_services.entries_count(),
                    "emitted store metrics"
                );
            }
            _ = shutdown.cancelled() => {
                debug!("metrics loop shutting down");
                return;
            }
        }
    }
}

/// Authoritative DNS server for the cluster-set zones.
///
/// Owns the stores and oracles the handler reads. Controllers watching
/// the federation control plane obtain cloned handles through the
/// accessors and mutate them freely while the server runs.
pub struct DnsServer {
    config: DnsConfig,
    imports: ImportMap,
    endpoints: EndpointSliceMap,
    local_services: LocalServiceMap,
    cluster_status: ClusterStatusMap,
    endpoint_health: EndpointHealthMap,
}

impl DnsServer {
    /// Create a new DNS server with the given configuration and empty
    /// stores.
    pub fn new(config: DnsConfig) -> Self {
        Self {
            config,
            imports: ImportMap::new(),
            endpoints: EndpointSliceMap::new(),
            local_services: LocalServiceMap::new(),
            cluster_status: ClusterStatusMap::new(),
            endpoint_health: EndpointHealthMap::new(),
        }
    }

    /// Handle to the service-import store.
    pub fn imports(&self) -> ImportMap {
        self.imports.clone()
    }

    /// Handle to the endpoint-slice store.
    pub fn endpoints(&self) -> EndpointSliceMap {
        self.endpoints.clone()
    }

    /// Handle to the local-services index.
    pub fn local_services(&self) -> LocalServiceMap {
        self.local_services.clone()
    }

    /// Handle to the cluster-connectivity map.
    pub fn cluster_status(&self) -> ClusterStatusMap {
        self.cluster_status.clone()
    }

    /// Handle to the endpoint-health map.
    pub fn endpoint_health(&self) -> EndpointHealthMap {
        self.endpoint_health.clone()
    }

    /// Run the DNS server until the token is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DnsError> {
        info!(
            listen_addr = %self.config.listen_addr,
            zones = ?self.config.zones,
            ttl = self.config.ttl,
            "starting clusterset-dns server"
        );

        let handler = ClusterSetDns::new(
            &self.config,
            self.imports.clone(),
            self.endpoints.clone(),
            Arc::new(self.local_services.clone()),
            Arc::new(self.cluster_status.clone()),
            Arc::new(self.endpoint_health.clone()),
        );

        let mut server = ServerFuture::new(handler);

        let udp_socket = UdpSocket::bind(self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "DNS UDP listening");
        server.register_socket(udp_socket);

        let tcp_listener = TcpListener::bind(self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "DNS TCP listening");
        server.register_listener(tcp_listener, TCP_TIMEOUT);

        let metrics_token = shutdown.child_token();
        let metrics_handle = tokio::spawn(metrics_loop(
            self.imports.clone(),
            self.endpoints.clone(),
            self.local_services.clone(),
            metrics_token.clone(),
        ));

        info!(zones = ?self.config.zones, "DNS server ready to serve queries");

        let result = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("DNS server shutdown requested");
                Ok(())
            }
            result = server.block_until_done() => {
                if let Err(e) = &result {
                    error!("DNS server error: {e}");
                }
                result.map_err(DnsError::from)
            }
        };

        metrics_token.cancel();
        let _ = metrics_handle.await;

        info!("DNS server stopped");
        result
    }
}
