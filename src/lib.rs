//! clusterset-dns - Service-discovery DNS for multi-cluster service sets.
//!
//! This crate answers DNS questions for a synthetic zone (by default
//! `clusterset.local.`) representing the services exported from the
//! peer clusters of a federated cluster set. Given a name like
//! `<svc>.<ns>.svc.clusterset.local.`, it decides which clusters
//! currently own usable endpoints for the service and synthesises
//! A/AAAA/SRV answers over them.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         clusterset-dns                            │
//! │                                                                   │
//! │  ┌──────────────────┐     ┌───────────────────────┐               │
//! │  │ controllers      │───▶ │ stores                │               │
//! │  │ (out of crate)   │     │ imports / endpoints / │               │
//! │  └──────────────────┘     │ local services        │               │
//! │        │                  └──────────┬────────────┘               │
//! │        │ connectivity +              │                            │
//! │        │ endpoint health             ▼                            │
//! │        │                  ┌───────────────────────┐               │
//! │        └─────────────────▶│ ClusterSetDns handler │◀── UDP/TCP    │
//! │                           │ parse→select→build    │     :53       │
//! │                           └──────────┬────────────┘               │
//! │                                      │ fallthrough                │
//! │                                      ▼                            │
//! │                           ┌───────────────────────┐               │
//! │                           │ next handler (chain)  │               │
//! │                           └───────────────────────┘               │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Query forms
//!
//! ```text
//! svc1.ns1.svc.clusterset.local.            → service across clusters
//! cluster2.svc1.ns1.svc.clusterset.local.   → one cluster only
//! _http._tcp.svc1.ns1.svc.clusterset.local. → SRV port/protocol subset
//! ```
//!
//! Selection prefers the local cluster while it is connected and
//! healthy, drops disconnected clusters, and resolves headless services
//! through their per-cluster endpoint slices.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use clusterset_dns::{DnsConfig, DnsServer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = DnsConfig {
//!         listen_addr: "0.0.0.0:53".parse().unwrap(),
//!         zones: vec!["clusterset.local.".to_string()],
//!         fallthrough_zones: vec![],
//!         ttl: 5,
//!     };
//!
//!     let shutdown = CancellationToken::new();
//!     let server = DnsServer::new(config);
//!     // hand server.imports(), server.cluster_status(), ... to the
//!     // controllers, then:
//!     server.run(shutdown).await.unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod endpoints;
pub mod error;
pub mod handler;
pub mod imports;
pub mod local;
pub mod metrics;
pub mod parse;
pub mod record;
pub mod records;
pub mod selection;
pub mod server;
pub mod status;
pub mod telemetry;

// Re-export main types
pub use config::{Config, DnsConfig, TelemetryConfig};
pub use endpoints::{Endpoint, EndpointSlice, EndpointSliceMap};
pub use error::{DnsError, ServeError};
pub use handler::{ClusterSetDns, NoNext};
pub use imports::{ImportMap, ServiceImport};
pub use local::{LocalServiceMap, LocalServices};
pub use record::{DnsRecord, ServicePort, ServiceType};
pub use server::DnsServer;
pub use status::{ClusterStatus, ClusterStatusMap, EndpointHealthMap, EndpointsStatus};
