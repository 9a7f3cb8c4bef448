//! Prometheus metrics.
//!
//! The crate emits through the `metrics` facade and is silent until a
//! recorder is installed. This is a convenience for embedders that want the
//! Prometheus text format without wiring a recorder themselves.

use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Counter and histogram names emitted by this crate.
pub const METRIC_NAMES: &[&str] = &[
    "graph_nodes_created_total",
    "graph_edges_created_total",
    "graph_traversals_total",
    "graph_index_tables_created_total",
    "graph_partial_writes_total",
    "storage_operations_total",
    "storage_operation_duration_ms",
];

/// Installs a Prometheus recorder as the global `metrics` recorder.
///
/// The returned handle renders the current snapshot with
/// [`PrometheusHandle::render`]; exposing it over HTTP is up to the caller.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if a global recorder is already set.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|e| Error::OperationFailed {
        operation: "metrics_recorder_install".to_string(),
        cause: e.to_string(),
    })?;
    tracing::info!("prometheus recorder installed");
    Ok(handle)
}
