//! # graphrel
//!
//! A directed property graph stored in a relational database.
//!
//! Nodes carry JSON payloads, edges carry an optional label and payload, and
//! everything lives in a handful of plain tables. On top of that the crate
//! answers bounded-depth path queries and key/value lookups through per-key
//! secondary indexes.
//!
//! ## Features
//!
//! - Direction-aware traversal (out, in, either) over a depth range, as a
//!   single self-join with no node revisited on a path
//! - Optional end node and edge label filters
//! - Index tables created on first use, with conjunctive multi-key lookup
//! - Pluggable storage through [`StorageAdapter`], with a bundled `SQLite`
//!   implementation
//!
//! ## Example
//!
//! ```rust
//! use graphrel::{Direction, Graph, Traversal};
//! use serde_json::json;
//!
//! # fn main() -> graphrel::Result<()> {
//! let graph = Graph::in_memory()?;
//! let a = graph.create_node(&json!({"name": "a"}))?;
//! let b = graph.create_node(&json!({"name": "b"}))?;
//! let c = graph.create_node(&json!({"name": "c"}))?;
//! a.create_edge(&b, None, None)?;
//! b.create_edge(&c, None, None)?;
//!
//! let result = graph.traverse(
//!     &Traversal::new(a.id())
//!         .with_direction(Direction::Out)
//!         .with_depth(3),
//! )?;
//! assert_eq!(result.len(), 1);
//! assert_eq!(result.node_ids(), vec![a.id(), b.id(), c.id()]);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod graph;
pub mod models;
pub mod observability;
pub mod storage;

pub use config::GraphConfig;
pub use graph::{Edge, Graph, IndexManager, Node, Path, PathCursor, TraversalResult};
pub use models::{DepthRange, Direction, EdgeId, EdgeProvenance, NodeId, Traversal};
pub use storage::{SqlValue, SqliteAdapter, StorageAdapter};

/// Error type for graph operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Storage` | The backing store rejects a statement, or stored data is unreadable |
/// | `NotFound` | Reading the payload of a node that has no row |
/// | `InvalidKey` | Index key outside `[A-Za-z0-9]+` |
/// | `AmbiguousResult` | `find_one` matched zero or several nodes |
/// | `PartialWrite` | A multi-statement write failed after its first statement |
/// | `InvalidInput` | Bad depth range, oversized index value, empty criteria |
/// | `OperationFailed` | Config file or logging setup failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The storage backend failed.
    ///
    /// Raised when:
    /// - A statement cannot be prepared or executed
    /// - A unique constraint is violated (e.g. duplicate explicit node id)
    /// - A stored payload is not valid JSON
    ///
    /// Never retried by the core.
    #[error("storage operation '{operation}' failed: {cause}")]
    Storage {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A row that must exist does not.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity, e.g. `node`.
        entity: String,
        /// The missing id.
        id: String,
    },

    /// An index key is not made of ASCII letters and digits.
    #[error("invalid index key: {key:?}")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// A single-result lookup did not match exactly one node.
    #[error("expected exactly one result, found {count}")]
    AmbiguousResult {
        /// Number of matches.
        count: usize,
    },

    /// A write spanning several statements failed partway.
    ///
    /// Rows already written are left in place.
    #[error("operation '{operation}' failed after writing {written}: {cause}")]
    PartialWrite {
        /// The operation that failed.
        operation: String,
        /// What was written before the failure.
        written: String,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A depth range is inverted or exceeds the configured maximum
    /// - An index value is longer than the configured maximum
    /// - An index lookup has no criteria
    /// - A payload cannot be serialized
    /// - A log filter directive does not parse
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A non-storage operation failed.
    ///
    /// Raised when:
    /// - A config file cannot be read or parsed
    /// - A global tracing subscriber is already installed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::NotFound {
            entity: "node".to_string(),
            id: "7".to_string(),
        };
        assert_eq!(err.to_string(), "node 7 not found");

        let err = Error::InvalidKey {
            key: "a-b".to_string(),
        };
        assert_eq!(err.to_string(), "invalid index key: \"a-b\"");

        let err = Error::AmbiguousResult { count: 3 };
        assert_eq!(err.to_string(), "expected exactly one result, found 3");

        let err = Error::PartialWrite {
            operation: "create_edge".to_string(),
            written: "inferred edge row 4".to_string(),
            cause: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'create_edge' failed after writing inferred edge row 4: disk full"
        );
    }
}
