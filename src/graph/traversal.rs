//! Bounded-depth path search over the edge table.
//!
//! A traversal of up to `max` hops is one SELECT that self-joins the edge
//! table `max` times. Hop `h` is aliased `e<h>` and walks from its `near`
//! column to its `far` column:
//!
//! | Direction | near | far | rows |
//! |-----------|------|-----|------|
//! | `Out` | `from_id` | `to_id` | real only |
//! | `In` | `to_id` | `from_id` | real only |
//! | `Either` | `from_id` | `to_id` | real and inferred |
//!
//! Hops up to `min` are inner joins, so shorter rows drop out; later hops are
//! left joins, so a path that cannot be extended is kept with trailing NULLs.
//! Each row selects the far endpoint of every hop and becomes one [`Path`].

use super::Shared;
use super::node::Node;
use crate::models::{Direction, EdgeProvenance, NodeId, Traversal};
use crate::storage::schema::EDGE_TABLE;
use crate::storage::{Row, SelectBuilder, SqlValue, Statement};
use std::collections::HashSet;
use std::sync::Arc;
use std::vec;

const fn columns(direction: Direction) -> (&'static str, &'static str) {
    match direction {
        Direction::Out | Direction::Either => ("from_id", "to_id"),
        Direction::In => ("to_id", "from_id"),
    }
}

/// Renders the self-join for `traversal`. Requires `1 <= max`.
pub(crate) fn build_statement(traversal: &Traversal) -> Statement {
    let (near, far) = columns(traversal.direction());
    let start = SqlValue::from(traversal.start().get());
    let real = traversal
        .direction()
        .is_directional()
        .then(|| SqlValue::from(EdgeProvenance::Real.as_i64()));
    let label = traversal.label().map(SqlValue::from);
    let end = traversal.end().map(|n| SqlValue::from(n.get()));
    let depth = traversal.depth();
    let max = depth.max().max(1);

    let mut builder = SelectBuilder::new()
        .select(
            (1..=max)
                .map(|h| format!("e{h}.{far}"))
                .collect::<Vec<_>>()
                .join(", "),
        )
        .from(format!("{EDGE_TABLE} e1"))
        .where_clause(format!("e1.{near} = ?"), [start.clone()])
        .and_where(format!("e1.{far} <> ?"), [start.clone()]);
    if let Some(real) = &real {
        builder = builder.and_where("e1.provenance = ?", [real.clone()]);
    }
    if let Some(label) = &label {
        builder = builder.and_where("e1.label = ?", [label.clone()]);
    }

    for h in 2..=max {
        let prev = h - 1;
        let visited = (1..h).map(|i| format!("e{i}.{far}")).collect::<Vec<_>>().join(", ");
        let mut clauses = vec![
            format!("e{h}.{near} = e{prev}.{far}"),
            format!("e{h}.{far} NOT IN (?, {visited})"),
        ];
        let mut params = vec![start.clone()];

        if let Some(real) = &real {
            clauses.push(format!("e{h}.provenance = ?"));
            params.push(real.clone());
        }
        if let Some(label) = &label {
            clauses.push(format!("e{h}.label = ?"));
            params.push(label.clone());
        }
        if let Some(end) = &end {
            // Stop at the end node rather than walking through it.
            clauses.push(format!("e{prev}.{far} <> ?"));
            params.push(end.clone());
        }
        let condition = format!("{EDGE_TABLE} e{h} ON {}", clauses.join(" AND "));

        builder = if h <= depth.min() {
            builder.inner_join(condition, params)
        } else {
            builder.left_join(condition, params)
        };
    }

    if let Some(end) = end {
        let terminus = (1..=max)
            .rev()
            .map(|h| format!("e{h}.{far}"))
            .collect::<Vec<_>>()
            .join(", ");
        builder = builder.and_where(format!("COALESCE({terminus}) = ?"), [end]);
    }

    for h in 1..=max {
        builder = builder.order_by(format!("e{h}.id"));
    }

    builder.build()
}

/// An ordered walk: the start node, then one node per hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<Node>,
}

impl Path {
    /// Nodes from start to terminus.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node ids from start to terminus.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(Node::id).collect()
    }

    /// Number of nodes, including the start.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` only for a path with no nodes, which a traversal never yields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges walked.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// First node.
    #[must_use]
    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Last node.
    #[must_use]
    pub fn terminus(&self) -> Option<&Node> {
        self.nodes.last()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Single-pass iterator over traversal results.
///
/// Rows are fetched when the cursor is created; paths are built as the
/// cursor is advanced. Use [`into_result`](Self::into_result) to collect
/// everything into a [`TraversalResult`].
pub struct PathCursor {
    shared: Arc<Shared>,
    start: NodeId,
    trivial: bool,
    rows: vec::IntoIter<Row>,
}

impl PathCursor {
    pub(crate) fn new(shared: Arc<Shared>, start: NodeId, trivial: bool, rows: Vec<Row>) -> Self {
        Self {
            shared,
            start,
            trivial,
            rows: rows.into_iter(),
        }
    }

    /// Consumes the rest of the cursor.
    #[must_use]
    pub fn into_result(self) -> TraversalResult {
        TraversalResult::from_paths(self)
    }

    fn path_from_row(&self, row: &Row) -> Path {
        let mut nodes = Vec::with_capacity(row.len() + 1);
        nodes.push(Node::attach(&self.shared, self.start));
        nodes.extend(
            (0..row.len())
                .map_while(|idx| row.opt_i64(idx))
                .map(|id| Node::attach(&self.shared, NodeId::new(id))),
        );
        Path { nodes }
    }
}

impl Iterator for PathCursor {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        if self.trivial {
            self.trivial = false;
            return Some(Path {
                nodes: vec![Node::attach(&self.shared, self.start)],
            });
        }
        let row = self.rows.next()?;
        Some(self.path_from_row(&row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.rows.len() + usize::from(self.trivial);
        (n, Some(n))
    }
}

impl std::fmt::Debug for PathCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathCursor")
            .field("start", &self.start)
            .field("remaining", &self.size_hint().0)
            .finish()
    }
}

/// Materialized traversal output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalResult {
    paths: Vec<Path>,
    nodes: Vec<Node>,
}

impl TraversalResult {
    fn from_paths(paths: impl IntoIterator<Item = Path>) -> Self {
        let paths: Vec<Path> = paths.into_iter().collect();
        let mut seen = HashSet::new();
        let nodes = paths
            .iter()
            .flat_map(Path::nodes)
            .filter(|n| seen.insert(n.id()))
            .cloned()
            .collect();
        Self { paths, nodes }
    }

    /// Paths in result order.
    #[must_use]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Every node on any path, once each, in order of first appearance.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Ids of [`nodes`](Self::nodes).
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(Node::id).collect()
    }

    /// Number of paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// `true` if no path was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_single_hop_out() {
        let stmt = build_statement(&Traversal::new(NodeId::new(7)));
        assert_eq!(
            stmt.sql,
            "SELECT e1.to_id\nFROM edge e1\n\
             WHERE (e1.from_id = ?) AND (e1.to_id <> ?) AND (e1.provenance = ?)\n\
             ORDER BY e1.id"
        );
        assert_eq!(
            stmt.params,
            vec![SqlValue::Integer(7), SqlValue::Integer(7), SqlValue::Integer(0)]
        );
    }

    #[test]
    fn test_join_kinds_follow_min() {
        let stmt = build_statement(&Traversal::new(NodeId::new(1)).with_depth_range(2, 3));
        assert!(stmt.sql.contains(
            "INNER JOIN edge e2 ON e2.from_id = e1.to_id AND e2.to_id NOT IN (?, e1.to_id)"
        ));
        assert!(stmt.sql.contains(
            "LEFT JOIN edge e3 ON e3.from_id = e2.to_id AND e3.to_id NOT IN (?, e1.to_id, e2.to_id)"
        ));
        assert!(stmt.sql.ends_with("ORDER BY e1.id, e2.id, e3.id"));
    }

    #[test]
    fn test_in_walks_reversed_columns() {
        let traversal = Traversal::new(NodeId::new(1))
            .with_direction(Direction::In)
            .with_depth(2);
        let stmt = build_statement(&traversal);
        assert!(stmt.sql.starts_with("SELECT e1.from_id, e2.from_id\nFROM edge e1"));
        assert!(stmt.sql.contains("WHERE (e1.to_id = ?)"));
        assert!(stmt.sql.contains("e2.provenance = ?"));
    }

    #[test]
    fn test_either_skips_provenance_filter() {
        let traversal = Traversal::new(NodeId::new(1))
            .with_direction(Direction::Either)
            .with_depth(2);
        let stmt = build_statement(&traversal);
        assert!(!stmt.sql.contains("provenance"));
    }

    #[test]
    fn test_end_constraint() {
        let traversal = Traversal::new(NodeId::new(1))
            .with_depth(2)
            .with_end(NodeId::new(4))
            .with_label("r");
        let stmt = build_statement(&traversal);
        assert!(stmt.sql.contains("AND e2.label = ? AND e1.to_id <> ?"));
        assert!(stmt.sql.contains("(COALESCE(e2.to_id, e1.to_id) = ?)"));
        // join: start, real, label, end | where: start, start, real, label, end
        assert_eq!(stmt.params.len(), 9);
        assert_eq!(stmt.params[3], SqlValue::Integer(4));
        assert_eq!(stmt.params[4], SqlValue::Integer(1));
        assert_eq!(stmt.params[7], SqlValue::from("r"));
        assert_eq!(stmt.params[8], SqlValue::Integer(4));
    }

    #[test_case(1 ; "one hop")]
    #[test_case(5 ; "five hops")]
    #[test_case(63 ; "join cap")]
    fn test_placeholders_match_params(max: u32) {
        let stmt = build_statement(
            &Traversal::new(NodeId::new(1))
                .with_depth(max)
                .with_label("x")
                .with_end(NodeId::new(2)),
        );
        assert_eq!(stmt.sql.matches('?').count(), stmt.params.len());
    }
}
