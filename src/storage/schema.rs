//! Table names and reference DDL for the graph store.
//!
//! The base tables are owned by whoever provisions the store. [`ensure_schema`]
//! is a bootstrap for embedders and tests: it only ever runs
//! `CREATE ... IF NOT EXISTS` and never alters an existing table.
//!
//! # Layout
//!
//! | Table | Columns |
//! |-------|---------|
//! | `node` | `id`, `payload` (JSON text) |
//! | `edge` | `id`, `from_id`, `to_id`, `label`, `provenance` (0 real, 1 inferred) |
//! | `edge_payload` | `edge_id`, `payload` (JSON text) |
//! | `index_<key>` | `id`, `node_id`, `value` |

use crate::Result;
use crate::storage::traits::StorageAdapter;

/// Node table.
pub const NODE_TABLE: &str = "node";
/// Edge adjacency table.
pub const EDGE_TABLE: &str = "edge";
/// Edge payload side table.
pub const EDGE_PAYLOAD_TABLE: &str = "edge_payload";
/// Prefix shared by every per-key index table.
pub const INDEX_TABLE_PREFIX: &str = "index_";

/// DDL for the base tables.
pub const BASE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS node (
    id INTEGER PRIMARY KEY,
    payload TEXT NOT NULL DEFAULT '{}'
);
CREATE TABLE IF NOT EXISTS edge (
    id INTEGER PRIMARY KEY,
    from_id INTEGER NOT NULL,
    to_id INTEGER NOT NULL,
    label TEXT,
    provenance INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_edge_from ON edge(from_id, provenance);
CREATE INDEX IF NOT EXISTS idx_edge_to ON edge(to_id, provenance);
CREATE TABLE IF NOT EXISTS edge_payload (
    edge_id INTEGER PRIMARY KEY,
    payload TEXT NOT NULL
);
";

/// Returns the physical table name for an already-validated, lowercased
/// index key.
#[must_use]
pub fn index_table_name(key: &str) -> String {
    format!("{INDEX_TABLE_PREFIX}{key}")
}

/// Returns the DDL creating the index table for an already-validated key.
///
/// The `id` column records insertion order so lookups can return nodes in the
/// order they were first indexed.
#[must_use]
pub fn index_table_ddl(key: &str) -> String {
    let table = index_table_name(key);
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY,
            node_id INTEGER NOT NULL,
            value TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS {table}_value ON {table}(value);
        CREATE INDEX IF NOT EXISTS {table}_node ON {table}(node_id);"
    )
}

/// Creates the base tables if they are missing.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub fn ensure_schema(store: &dyn StorageAdapter) -> Result<()> {
    store.exec_batch(BASE_SCHEMA)?;
    tracing::info!("graph schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::SqliteAdapter;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let store = SqliteAdapter::in_memory().unwrap();
        ensure_schema(&store).unwrap();
        ensure_schema(&store).unwrap();

        for table in [NODE_TABLE, EDGE_TABLE, EDGE_PAYLOAD_TABLE] {
            assert!(store.table_exists(table).unwrap(), "{table} missing");
        }
    }

    #[test]
    fn test_index_table_naming() {
        assert_eq!(index_table_name("type"), "index_type");
        let ddl = index_table_ddl("gender");
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS index_gender"));
        assert!(ddl.contains("index_gender_value ON index_gender(value)"));
    }

    #[test]
    fn test_index_ddl_creates_table() {
        let store = SqliteAdapter::in_memory().unwrap();
        store.exec_batch(&index_table_ddl("colour")).unwrap();
        store.exec_batch(&index_table_ddl("colour")).unwrap();
        assert_eq!(store.list_tables(INDEX_TABLE_PREFIX).unwrap(), vec!["index_colour"]);
    }
}
