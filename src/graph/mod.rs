//! Property graph over a relational store.
//!
//! [`Graph`] is the entry point. It hands out [`Node`] and [`Edge`] handles,
//! runs traversals, and gives access to the [`IndexManager`].
//!
//! # Example
//!
//! ```rust
//! use graphrel::graph::Graph;
//! use graphrel::models::{Direction, Traversal};
//! use serde_json::json;
//!
//! # fn main() -> graphrel::Result<()> {
//! let graph = Graph::in_memory()?;
//! let alice = graph.create_node(&json!({"name": "alice"}))?;
//! let bob = graph.create_node(&json!({"name": "bob"}))?;
//! alice.create_edge(&bob, Some("knows"), None)?;
//! alice.index("name", "alice")?;
//!
//! let found = graph.index().find_one([("name", "alice")])?;
//! assert_eq!(found, alice);
//!
//! let result = graph.traverse(&Traversal::new(alice.id()).with_direction(Direction::Out))?;
//! assert_eq!(result.node_ids(), vec![alice.id(), bob.id()]);
//! # Ok(())
//! # }
//! ```

mod edge;
mod index;
mod node;
mod traversal;

pub use edge::Edge;
pub use index::{IndexManager, is_valid_key};
pub use node::Node;
pub use traversal::{Path, PathCursor, TraversalResult};

use crate::config::GraphConfig;
use crate::models::{NodeId, Traversal, payload};
use crate::storage::schema::{EDGE_PAYLOAD_TABLE, EDGE_TABLE, NODE_TABLE};
use crate::storage::{SqlValue, SqliteAdapter, StorageAdapter, ensure_schema};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// State every handle shares: the store and the limits it is used under.
pub(crate) struct Shared {
    pub(crate) store: Arc<dyn StorageAdapter>,
    pub(crate) config: GraphConfig,
}

/// A graph bound to one store.
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct Graph {
    shared: Arc<Shared>,
}

impl Graph {
    /// Wraps an already provisioned store with default configuration.
    #[must_use]
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self::with_config(store, GraphConfig::default())
    }

    /// Wraps an already provisioned store.
    #[must_use]
    pub fn with_config(store: Arc<dyn StorageAdapter>, config: GraphConfig) -> Self {
        Self {
            shared: Arc::new(Shared { store, config }),
        }
    }

    /// Opens the `SQLite` store named by `config.db_path` (in memory when
    /// unset) and creates the base tables if they are missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or bootstrapped.
    #[instrument(skip(config), fields(db_path = ?config.db_path))]
    pub fn open(config: &GraphConfig) -> Result<Self> {
        let adapter = match &config.db_path {
            Some(path) => SqliteAdapter::open_with_timeout(path, config.busy_timeout)?,
            None => SqliteAdapter::in_memory()?,
        };
        ensure_schema(&adapter)?;
        Ok(Self::with_config(Arc::new(adapter), config.clone()))
    }

    /// Opens a fresh in-memory graph with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn in_memory() -> Result<Self> {
        Self::open(&GraphConfig::default())
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StorageAdapter> {
        &self.shared.store
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.shared.config
    }

    /// Creates a node with a store-assigned id.
    ///
    /// Empty payloads (`null`, `{}`, `[]`) are stored as `{}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded or the insert fails.
    #[instrument(skip(self, payload))]
    pub fn create_node(&self, payload: &Value) -> Result<Node> {
        let encoded = payload::encode(payload)?;
        let id = self.shared.store.insert(
            &format!("INSERT INTO {NODE_TABLE} (payload) VALUES (?)"),
            &[SqlValue::from(encoded)],
        )?;
        metrics::counter!("graph_nodes_created_total").increment(1);
        tracing::debug!(node_id = id, "created node");
        Ok(self.node(NodeId::new(id)))
    }

    /// Creates a node with an explicit id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the id is already taken.
    #[instrument(skip(self, payload), fields(node_id = %id))]
    pub fn create_node_with_id(&self, id: NodeId, payload: &Value) -> Result<Node> {
        let encoded = payload::encode(payload)?;
        self.shared.store.execute(
            &format!("INSERT INTO {NODE_TABLE} (id, payload) VALUES (?, ?)"),
            &[SqlValue::from(id.get()), SqlValue::from(encoded)],
        )?;
        metrics::counter!("graph_nodes_created_total").increment(1);
        Ok(self.node(id))
    }

    /// Returns a handle for `id` without touching the store.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Node {
        Node::attach(&self.shared, id)
    }

    /// Returns `true` if a node row with this id exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn node_exists(&self, id: NodeId) -> Result<bool> {
        let rows = self.shared.store.query(
            &format!("SELECT 1 FROM {NODE_TABLE} WHERE id = ?"),
            &[SqlValue::from(id.get())],
        )?;
        Ok(!rows.is_empty())
    }

    /// Creates an edge `from -> to`.
    ///
    /// Two edge rows are written: an inferred `to -> from` mirror, then the
    /// real row that is returned. The payload, if any, is stored against the
    /// real row.
    ///
    /// # Errors
    ///
    /// Returns a storage error if nothing was written, or
    /// [`Error::PartialWrite`](crate::Error::PartialWrite) if some rows were.
    pub fn create_edge(
        &self,
        from: NodeId,
        to: NodeId,
        label: Option<&str>,
        payload: Option<&Value>,
    ) -> Result<Edge> {
        edge::insert_edge(&self.shared, from, to, label, payload)
    }

    /// Runs `traversal` and collects every path.
    ///
    /// # Errors
    ///
    /// See [`traverse_cursor`](Self::traverse_cursor).
    pub fn traverse(&self, traversal: &Traversal) -> Result<TraversalResult> {
        Ok(self.traverse_cursor(traversal)?.into_result())
    }

    /// Runs `traversal` and returns a single-pass cursor over its paths.
    ///
    /// A `max` of 0 yields only the start node, without reading the store. A
    /// `min` of 0 adds that trivial path in front of the others. With an end
    /// node set, the trivial path is only kept when start and end coincide.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) if the
    /// depth range is inverted or exceeds the configured maximum, or a
    /// storage error if the query fails.
    #[instrument(
        skip(self, traversal),
        fields(
            start = %traversal.start(),
            direction = %traversal.direction(),
            depth = %traversal.depth(),
        )
    )]
    pub fn traverse_cursor(&self, traversal: &Traversal) -> Result<PathCursor> {
        let depth = traversal.depth();
        depth.validate(self.shared.config.max_traversal_depth)?;

        metrics::counter!(
            "graph_traversals_total",
            "direction" => traversal.direction().as_str()
        )
        .increment(1);

        let trivial = depth.min() == 0 && traversal.end().is_none_or(|end| end == traversal.start());
        let rows = if depth.max() == 0 {
            Vec::new()
        } else {
            let stmt = traversal::build_statement(traversal);
            tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "traversal query");
            self.shared.store.query(&stmt.sql, &stmt.params)?
        };

        tracing::debug!(rows = rows.len(), "traversal complete");
        Ok(PathCursor::new(
            Arc::clone(&self.shared),
            traversal.start(),
            trivial,
            rows,
        ))
    }

    /// A fresh index manager with its own key cache.
    #[must_use]
    pub fn index(&self) -> IndexManager {
        IndexManager::new(Arc::clone(&self.shared))
    }

    /// Deletes every node, edge, edge payload and index entry.
    ///
    /// Tables are emptied, not dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if any delete fails. Tables emptied before the
    /// failure stay empty.
    #[instrument(skip(self))]
    pub fn truncate(&self) -> Result<()> {
        for table in [NODE_TABLE, EDGE_TABLE, EDGE_PAYLOAD_TABLE] {
            self.shared.store.execute(&format!("DELETE FROM {table}"), &[])?;
        }
        self.index().truncate_all()?;
        tracing::info!("graph truncated");
        Ok(())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}
