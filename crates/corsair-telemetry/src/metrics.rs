//! Prometheus metrics for CORS decisions.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `corsair_preflight_total` | Counter | `outcome` | Preflight requests answered |
//! | `corsair_actual_total` | Counter | `outcome` | Actual requests passed through |
//!
//! `outcome` is one of `granted`, `denied`, `unmatched` and, for actual
//! requests only, `no_origin`.
//!
//! Recording is a no-op until a recorder is installed, so libraries can
//! record unconditionally.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;

/// Counter of answered preflight requests.
pub const PREFLIGHT_TOTAL: &str = "corsair_preflight_total";

/// Counter of actual requests seen by the CORS stage.
pub const ACTUAL_TOTAL: &str = "corsair_actual_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address for the Prometheus scrape endpoint (e.g., "0.0.0.0:9090").
    /// Without one, metrics are only available through [`render_metrics`].
    pub addr: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: None,
        }
    }
}

/// Initializes the metrics subsystem.
///
/// With an `addr`, the scrape endpoint is spawned on the current Tokio
/// runtime, so this must then be called from within one.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if the recorder cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = match &config.addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
                TelemetryError::metrics_init(format!("metrics listener needs a Tokio runtime: {e}"))
            })?;

            let (recorder, exporter) = PrometheusBuilder::new()
                .with_http_listener(addr)
                .build()
                .map_err(|e| TelemetryError::metrics_init(e.to_string()))?;
            let handle = recorder.handle();
            metrics::set_global_recorder(recorder)
                .map_err(|e| TelemetryError::metrics_init(e.to_string()))?;

            runtime.spawn(async move {
                if let Err(e) = exporter.await {
                    tracing::error!(error = ?e, "Prometheus exporter stopped");
                }
            });
            tracing::info!(%addr, "Prometheus metrics endpoint started");
            handle
        }
        None => PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| TelemetryError::metrics_init(e.to_string()))?,
    };

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(PREFLIGHT_TOTAL, "CORS preflight requests answered, by outcome");
    describe_counter!(ACTUAL_TOTAL, "Actual requests seen by the CORS stage, by outcome");
}

/// Records an answered preflight request.
pub fn record_preflight(outcome: &'static str) {
    counter!(PREFLIGHT_TOTAL, "outcome" => outcome).increment(1);
}

/// Records an actual request.
pub fn record_actual(outcome: &'static str) {
    counter!(ACTUAL_TOTAL, "outcome" => outcome).increment(1);
}
