//! Node handles.

use super::Shared;
use super::edge::{self, Edge};
use super::index::IndexManager;
use crate::models::{Direction, NodeId, payload};
use crate::storage::schema::NODE_TABLE;
use crate::storage::{SelectBuilder, SqlValue};
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::instrument;

/// Handle to a node.
///
/// A handle is only an id bound to a store. Creating one does no I/O, and
/// the payload is read fresh on every [`payload`](Self::payload) call.
/// Two handles are equal when their ids are.
#[derive(Clone)]
pub struct Node {
    shared: Arc<Shared>,
    id: NodeId,
}

impl Node {
    pub(crate) fn attach(shared: &Arc<Shared>, id: NodeId) -> Self {
        Self {
            shared: Arc::clone(shared),
            id,
        }
    }

    /// Node id.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Reads the payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no node row has this id, or a storage
    /// error if the read fails.
    #[instrument(skip(self), fields(node_id = %self.id))]
    pub fn payload(&self) -> Result<Value> {
        let stmt = SelectBuilder::new()
            .select("payload")
            .from(NODE_TABLE)
            .where_clause("id = ?", [SqlValue::from(self.id.get())])
            .build();

        let rows = self.shared.store.query(&stmt.sql, &stmt.params)?;
        let row = rows.first().ok_or_else(|| Error::NotFound {
            entity: "node".to_string(),
            id: self.id.to_string(),
        })?;

        // A NULL payload column reads as the empty payload.
        row.opt_str(0)
            .map_or_else(|| Ok(Value::Object(serde_json::Map::new())), payload::decode)
    }

    /// Real edges incident to this node, in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    #[instrument(skip(self), fields(node_id = %self.id))]
    pub fn edges(&self, direction: Direction, label: Option<&str>) -> Result<Vec<Edge>> {
        edge::load_edges(&self.shared, self.id, direction, label)
    }

    /// Real edges connecting this node and `other`, in either direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn edges_between(&self, other: &Self) -> Result<Vec<Edge>> {
        Ok(self
            .edges(Direction::Either, None)?
            .into_iter()
            .filter(|e| e.other_end(self.id) == Some(other.id))
            .collect())
    }

    /// Number of edges [`edges`](Self::edges) would return for the same arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    #[instrument(skip(self), fields(node_id = %self.id))]
    pub fn degree(&self, direction: Direction, label: Option<&str>) -> Result<u64> {
        edge::count_edges(&self.shared, self.id, direction, label)
    }

    /// Creates an edge from this node to `to`.
    ///
    /// # Errors
    ///
    /// See [`Graph::create_edge`](crate::graph::Graph::create_edge).
    pub fn create_edge(
        &self,
        to: &Self,
        label: Option<&str>,
        payload: Option<&Value>,
    ) -> Result<Edge> {
        edge::insert_edge(&self.shared, self.id, to.id, label, payload)
    }

    /// Indexes this node under `key = value`.
    ///
    /// # Errors
    ///
    /// See [`IndexManager::add_entry`].
    pub fn index(&self, key: &str, value: &str) -> Result<()> {
        IndexManager::new(Arc::clone(&self.shared)).add_entry(self.id, key, value)
    }

    /// Indexes this node under every `(key, value)` pair, in order.
    ///
    /// Stops at the first failure; entries written before it are kept.
    ///
    /// # Errors
    ///
    /// See [`IndexManager::add_entry`].
    pub fn index_all<'a>(&self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<()> {
        let manager = IndexManager::new(Arc::clone(&self.shared));
        for (key, value) in entries {
            manager.add_entry(self.id, key, value)?;
        }
        Ok(())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use serde_json::json;

    #[test]
    fn test_payload_is_read_fresh() {
        let graph = Graph::in_memory().unwrap();
        let node = graph.create_node(&json!({"v": 1})).unwrap();
        assert_eq!(node.payload().unwrap(), json!({"v": 1}));

        graph
            .store()
            .execute("UPDATE node SET payload = ? WHERE id = ?", &[
                SqlValue::from(r#"{"v":2}"#),
                SqlValue::from(node.id().get()),
            ])
            .unwrap();
        assert_eq!(node.payload().unwrap(), json!({"v": 2}));
    }

    #[test]
    fn test_missing_node_payload_is_not_found() {
        let graph = Graph::in_memory().unwrap();
        let ghost = graph.node(NodeId::new(41));
        assert!(matches!(
            ghost.payload(),
            Err(Error::NotFound { ref entity, ref id }) if entity == "node" && id == "41"
        ));
    }

    #[test]
    fn test_directional_edges_hide_mirror_rows() {
        let graph = Graph::in_memory().unwrap();
        let a = graph.create_node(&Value::Null).unwrap();
        let b = graph.create_node(&Value::Null).unwrap();
        a.create_edge(&b, Some("follows"), None).unwrap();

        assert_eq!(a.degree(Direction::Out, None).unwrap(), 1);
        assert_eq!(a.degree(Direction::In, None).unwrap(), 0);
        assert_eq!(b.degree(Direction::In, None).unwrap(), 1);
        assert_eq!(b.degree(Direction::Out, None).unwrap(), 0);
        assert_eq!(b.degree(Direction::Either, None).unwrap(), 1);
        assert_eq!(a.degree(Direction::Out, Some("blocks")).unwrap(), 0);
    }

    #[test]
    fn test_edges_between_is_symmetric() {
        let graph = Graph::in_memory().unwrap();
        let a = graph.create_node(&Value::Null).unwrap();
        let b = graph.create_node(&Value::Null).unwrap();
        let c = graph.create_node(&Value::Null).unwrap();
        let ab = a.create_edge(&b, None, None).unwrap();
        let ba = b.create_edge(&a, Some("back"), None).unwrap();
        a.create_edge(&c, None, None).unwrap();

        assert_eq!(a.edges_between(&b).unwrap(), vec![ab.clone(), ba.clone()]);
        assert_eq!(b.edges_between(&a).unwrap(), vec![ab, ba]);
        assert!(b.edges_between(&c).unwrap().is_empty());
    }

    #[test]
    fn test_handles_compare_by_id() {
        let graph = Graph::in_memory().unwrap();
        assert_eq!(graph.node(NodeId::new(3)), graph.node(NodeId::new(3)));
        assert_eq!(format!("{:?}", graph.node(NodeId::new(3))), "Node { id: NodeId(3) }");
    }
}
