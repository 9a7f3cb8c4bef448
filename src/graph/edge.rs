//! Edge handles and the mirrored edge write.

use super::Shared;
use super::node::Node;
use crate::models::{Direction, EdgeId, EdgeProvenance, NodeId, payload};
use crate::storage::schema::{EDGE_PAYLOAD_TABLE, EDGE_TABLE};
use crate::storage::{Row, SelectBuilder, SqlValue};
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Columns read for every edge, in [`Edge::from_row`] order.
const EDGE_COLUMNS: &str = "id, from_id, to_id, label, provenance";

/// Handle to one stored edge row.
///
/// Endpoints, label and provenance are read with the row; the payload is
/// fetched on demand.
#[derive(Clone)]
pub struct Edge {
    shared: Arc<Shared>,
    id: EdgeId,
    from: NodeId,
    to: NodeId,
    label: Option<String>,
    provenance: EdgeProvenance,
}

impl Edge {
    pub(crate) fn from_row(shared: &Arc<Shared>, row: &Row) -> Result<Self> {
        let raw_provenance = row.i64(4)?;
        let provenance = EdgeProvenance::from_i64(raw_provenance).ok_or_else(|| Error::Storage {
            operation: "decode_edge".to_string(),
            cause: format!("unknown provenance {raw_provenance}"),
        })?;

        Ok(Self {
            shared: Arc::clone(shared),
            id: EdgeId::new(row.i64(0)?),
            from: NodeId::new(row.i64(1)?),
            to: NodeId::new(row.i64(2)?),
            label: row.opt_str(3).map(ToString::to_string),
            provenance,
        })
    }

    /// Row id.
    #[must_use]
    pub const fn id(&self) -> EdgeId {
        self.id
    }

    /// Source endpoint.
    #[must_use]
    pub fn from(&self) -> Node {
        Node::attach(&self.shared, self.from)
    }

    /// Target endpoint.
    #[must_use]
    pub fn to(&self) -> Node {
        Node::attach(&self.shared, self.to)
    }

    /// Source endpoint id.
    #[must_use]
    pub const fn from_id(&self) -> NodeId {
        self.from
    }

    /// Target endpoint id.
    #[must_use]
    pub const fn to_id(&self) -> NodeId {
        self.to
    }

    /// Label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether this is a caller-authored row or its mirror.
    #[must_use]
    pub const fn provenance(&self) -> EdgeProvenance {
        self.provenance
    }

    /// Returns the endpoint that is not `node`, or `None` if `node` is not
    /// on this edge.
    #[must_use]
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if node == self.from {
            Some(self.to)
        } else if node == self.to {
            Some(self.from)
        } else {
            None
        }
    }

    /// Fetches the payload. `None` if the edge was created without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored payload is corrupt.
    #[instrument(skip(self), fields(edge_id = %self.id))]
    pub fn payload(&self) -> Result<Option<Value>> {
        let stmt = SelectBuilder::new()
            .select("payload")
            .from(EDGE_PAYLOAD_TABLE)
            .where_clause("edge_id = ?", [SqlValue::from(self.id.get())])
            .build();

        let rows = self.shared.store.query(&stmt.sql, &stmt.params)?;
        rows.first()
            .map(|row| row.str(0).and_then(payload::decode))
            .transpose()
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("id", &self.id)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("label", &self.label)
            .field("provenance", &self.provenance)
            .finish()
    }
}

/// Starts the edge lookup shared by `edges` and `degree`.
///
/// Only real rows are matched. `Either` matches the node on either side.
pub(crate) fn incident_edges(
    select: &str,
    node: NodeId,
    direction: Direction,
    label: Option<&str>,
) -> SelectBuilder {
    let id = SqlValue::from(node.get());
    let builder = SelectBuilder::new().select(select).from(EDGE_TABLE);

    let builder = match direction {
        Direction::Out => builder.where_clause("from_id = ?", [id]),
        Direction::In => builder.where_clause("to_id = ?", [id]),
        Direction::Either => builder.where_clause("from_id = ? OR to_id = ?", [id.clone(), id]),
    };

    let mut builder = builder.and_where(
        "provenance = ?",
        [SqlValue::from(EdgeProvenance::Real.as_i64())],
    );
    if let Some(label) = label {
        builder = builder.and_where("label = ?", [SqlValue::from(label)]);
    }

    builder
}

/// Reads real edges incident to `node`, in row-id order.
pub(crate) fn load_edges(
    shared: &Arc<Shared>,
    node: NodeId,
    direction: Direction,
    label: Option<&str>,
) -> Result<Vec<Edge>> {
    let stmt = incident_edges(EDGE_COLUMNS, node, direction, label)
        .order_by("id")
        .build();
    tracing::debug!(sql = %stmt.sql, "loading edges");

    shared
        .store
        .query(&stmt.sql, &stmt.params)?
        .iter()
        .map(|row| Edge::from_row(shared, row))
        .collect()
}

/// Counts real edges incident to `node` with the same predicate as [`load_edges`].
pub(crate) fn count_edges(
    shared: &Shared,
    node: NodeId,
    direction: Direction,
    label: Option<&str>,
) -> Result<u64> {
    let stmt = incident_edges("COUNT(*)", node, direction, label).build();
    let rows = shared.store.query(&stmt.sql, &stmt.params)?;
    let count = rows.first().map_or(Ok(0), |row| row.i64(0))?;
    u64::try_from(count).map_err(|_| Error::Storage {
        operation: "count_edges".to_string(),
        cause: format!("negative count {count}"),
    })
}

/// Writes a user edge as an inferred mirror row, the real row, then the
/// optional payload row. An empty payload (`null`, `{}`, `[]`) writes no
/// payload row.
///
/// Statements run independently. If a later statement fails the earlier rows
/// stay behind and the failure is reported as [`Error::PartialWrite`].
#[instrument(skip_all, fields(from = %from, to = %to, label = ?label))]
pub(crate) fn insert_edge(
    shared: &Arc<Shared>,
    from: NodeId,
    to: NodeId,
    label: Option<&str>,
    payload: Option<&Value>,
) -> Result<Edge> {
    let encoded = payload
        .filter(|p| !payload::is_empty(p))
        .map(payload::encode)
        .transpose()?;
    let label_value = SqlValue::from(label.map(ToString::to_string));
    let sql = format!("INSERT INTO {EDGE_TABLE} (from_id, to_id, label, provenance) VALUES (?, ?, ?, ?)");

    let inferred_id = shared.store.insert(
        &sql,
        &[
            SqlValue::from(to.get()),
            SqlValue::from(from.get()),
            label_value.clone(),
            SqlValue::from(EdgeProvenance::Inferred.as_i64()),
        ],
    )?;

    let real_id = shared
        .store
        .insert(
            &sql,
            &[
                SqlValue::from(from.get()),
                SqlValue::from(to.get()),
                label_value,
                SqlValue::from(EdgeProvenance::Real.as_i64()),
            ],
        )
        .map_err(|e| partial_write(format!("inferred edge row {inferred_id}"), &e))?;

    if let Some(encoded) = encoded {
        shared
            .store
            .execute(
                &format!("INSERT INTO {EDGE_PAYLOAD_TABLE} (edge_id, payload) VALUES (?, ?)"),
                &[SqlValue::from(real_id), SqlValue::from(encoded)],
            )
            .map_err(|e| partial_write(format!("edge rows {inferred_id} and {real_id}"), &e))?;
    }

    metrics::counter!("graph_edges_created_total").increment(1);
    tracing::debug!(edge_id = real_id, inferred_id, "created edge");

    Ok(Edge {
        shared: Arc::clone(shared),
        id: EdgeId::new(real_id),
        from,
        to,
        label: label.map(ToString::to_string),
        provenance: EdgeProvenance::Real,
    })
}

fn partial_write(written: String, cause: &Error) -> Error {
    tracing::warn!(%written, error = %cause, "edge write left partial rows");
    metrics::counter!("graph_partial_writes_total", "operation" => "create_edge").increment(1);
    Error::PartialWrite {
        operation: "create_edge".to_string(),
        written,
        cause: cause.to_string(),
    }
}
