//! Logging and metrics-export setup.
//!
//! The resolver's observability surface is structured logs plus the
//! recorders in [`crate::metrics`]. This module wires the tracing
//! subscriber from [`TelemetryConfig`] and, when the `prometheus`
//! feature is enabled, serves the recorded metrics over HTTP.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;
use crate::error::DnsError;

/// Initialize the tracing subscriber and, if configured, the metrics
/// exporter.
///
/// A `RUST_LOG` environment variable overrides `telemetry.log_level`.
/// Fails if the configured filter does not parse or the Prometheus
/// exporter cannot bind its listener.
pub fn init(config: &TelemetryConfig) -> Result<(), DnsError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => log_filter(&config.log_level)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    #[cfg(feature = "prometheus")]
    if let Some(addr) = config.prometheus_addr {
        use metrics_exporter_prometheus::PrometheusBuilder;

        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| DnsError::Config(format!("prometheus exporter on {addr}: {e}")))?;

        tracing::info!(%addr, "Prometheus metrics exporter started");
    }

    Ok(())
}

/// Parse a configured log filter (e.g. "info" or
/// "clusterset_dns=debug,warn").
fn log_filter(directives: &str) -> Result<EnvFilter, DnsError> {
    EnvFilter::try_new(directives)
        .map_err(|e| DnsError::Config(format!("log filter {directives:?}: {e}")))
}
