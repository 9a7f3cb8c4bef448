//! Statement-level metrics for the `SQLite` adapter.

use std::time::Instant;

/// Records one adapter call.
///
/// Emits `storage_operations_total` (counter) and
/// `storage_operation_duration_ms` (histogram), both labelled by backend,
/// operation (`query`, `execute`, `insert`, `exec_batch`, `catalog`) and
/// status (`success` or `error`).
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Runs `f`, recording its outcome against `operation` for the `sqlite` backend.
pub fn timed<T>(operation: &'static str, f: impl FnOnce() -> crate::Result<T>) -> crate::Result<T> {
    let start = Instant::now();
    let result = f();
    let status = if result.is_ok() { "success" } else { "error" };
    record_operation_metrics("sqlite", operation, start, status);
    result
}
