//! `SQLite` storage adapter.
//!
//! ## Module Structure
//!
//! - [`adapter`]: [`SqliteAdapter`], the [`StorageAdapter`](crate::storage::traits::StorageAdapter) implementation
//! - `connection`: lock acquisition with poison recovery, connection pragmas
//! - `sql`: LIKE escaping for catalog scans
//! - `metrics`: per-statement counters and latency histograms

pub mod adapter;
mod connection;
mod metrics;
mod sql;

pub use adapter::SqliteAdapter;
pub use connection::{DEFAULT_BUSY_TIMEOUT, acquire_lock, configure_connection};
pub use metrics::record_operation_metrics;
pub use sql::{escape_like_wildcards, prefix_pattern};
