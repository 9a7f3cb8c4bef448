//! `SQLite` implementation of [`StorageAdapter`].

use super::connection::{DEFAULT_BUSY_TIMEOUT, acquire_lock, configure_connection};
use super::metrics::timed;
use super::sql::prefix_pattern;
use crate::storage::traits::StorageAdapter;
use crate::storage::value::{Row, SqlValue};
use crate::{Error, Result};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql, params, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Converts a borrowed `SQLite` value into an owned [`SqlValue`].
///
/// Reals and blobs are not produced by the graph schema; they are carried as
/// text so a foreign table scanned by mistake still decodes.
fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Integer(v),
        ValueRef::Real(v) => SqlValue::Text(v.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
        },
    }
}

fn storage_error(operation: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |e| Error::Storage {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// `SQLite`-backed storage adapter.
///
/// # Concurrency Model
///
/// Statements are serialized through a `Mutex<Connection>`. WAL mode and
/// `busy_timeout` handle contention with other processes on the same file.
/// [`insert`](StorageAdapter::insert) executes and reads the generated rowid
/// under a single lock acquisition, so concurrent graph callers sharing one
/// adapter never observe each other's ids.
pub struct SqliteAdapter {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteAdapter {
    /// Opens (or creates) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or configured.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_timeout(db_path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens a database file with an explicit busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or configured.
    pub fn open_with_timeout(db_path: impl Into<PathBuf>, busy_timeout: Duration) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(storage_error("open_sqlite"))?;
        configure_connection(&conn, busy_timeout)?;
        tracing::debug!(path = %db_path.display(), "opened sqlite store");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error("open_sqlite_memory"))?;
        configure_connection(&conn, DEFAULT_BUSY_TIMEOUT)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    /// Returns the database path (`None` for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn collect_rows(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let mut stmt = conn.prepare(sql).map_err(storage_error("query_prepare"))?;
        let column_count = stmt.column_count();
        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(storage_error("query"))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(storage_error("query_step"))? {
            let mut columns = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                columns.push(from_value_ref(
                    row.get_ref(idx).map_err(storage_error("query_column"))?,
                ));
            }
            out.push(Row::new(columns));
        }
        Ok(out)
    }
}

impl StorageAdapter for SqliteAdapter {
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        tracing::trace!(sql, params = params.len(), "query");
        timed("query", || {
            let conn = acquire_lock(&self.conn);
            Self::collect_rows(&conn, sql, params)
        })
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        tracing::trace!(sql, params = params.len(), "execute");
        timed("execute", || {
            let conn = acquire_lock(&self.conn);
            conn.execute(sql, params_from_iter(params.iter()))
                .map_err(storage_error("execute"))
        })
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(acquire_lock(&self.conn).last_insert_rowid())
    }

    fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64> {
        tracing::trace!(sql, params = params.len(), "insert");
        timed("insert", || {
            let conn = acquire_lock(&self.conn);
            conn.execute(sql, params_from_iter(params.iter()))
                .map_err(storage_error("insert"))?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn exec_batch(&self, ddl: &str) -> Result<()> {
        tracing::trace!(ddl, "exec_batch");
        timed("exec_batch", || {
            acquire_lock(&self.conn)
                .execute_batch(ddl)
                .map_err(storage_error("exec_batch"))
        })
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        timed("catalog", || {
            let conn = acquire_lock(&self.conn);
            let found: Option<i64> = conn
                .query_row(
                    // Table names are case-insensitive in SQLite
                    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                    params![name],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_error("table_exists"))?;
            Ok(found.is_some())
        })
    }

    fn list_tables(&self, prefix: &str) -> Result<Vec<String>> {
        timed("catalog", || {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type = 'table' AND name LIKE ?1 ESCAPE '\\'
                     ORDER BY name",
                )
                .map_err(storage_error("list_tables_prepare"))?;
            let names = stmt
                .query_map(params![prefix_pattern(prefix)], |row| row.get::<_, String>(0))
                .map_err(storage_error("list_tables"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_error("list_tables"))?;
            // LIKE is case-insensitive for ASCII in SQLite; keep exact-prefix matches only
            Ok(names
                .into_iter()
                .filter(|name| name.starts_with(prefix))
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn adapter_with_table() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter
            .exec_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score INTEGER)")
            .unwrap();
        adapter
    }

    #[test]
    fn test_insert_returns_rowid() {
        let adapter = adapter_with_table();
        let first = adapter
            .insert(
                "INSERT INTO t (name, score) VALUES (?, ?)",
                &[SqlValue::from("a"), SqlValue::Integer(1)],
            )
            .unwrap();
        let second = adapter
            .insert(
                "INSERT INTO t (name, score) VALUES (?, ?)",
                &[SqlValue::from("b"), SqlValue::Null],
            )
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(adapter.last_insert_id().unwrap(), 2);
    }

    #[test]
    fn test_query_decodes_nulls_and_text() {
        let adapter = adapter_with_table();
        adapter
            .execute(
                "INSERT INTO t (name, score) VALUES (?, ?)",
                &[SqlValue::from("a"), SqlValue::Null],
            )
            .unwrap();

        let rows = adapter
            .query("SELECT id, name, score FROM t WHERE name = ?", &[SqlValue::from("a")])
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].opt_i64(0), Some(1));
        assert_eq!(rows[0].opt_str(1), Some("a"));
        assert!(rows[0].get(2).is_some_and(SqlValue::is_null));
    }

    #[test]
    fn test_execute_reports_storage_error() {
        let adapter = adapter_with_table();
        let err = adapter.execute("INSERT INTO missing VALUES (1)", &[]).unwrap_err();
        assert!(matches!(err, Error::Storage { ref operation, .. } if operation == "execute"));
    }

    #[test]
    fn test_list_tables_is_exact_prefix() {
        let adapter = adapter_with_table();
        adapter
            .exec_batch(
                "CREATE TABLE index_type (x INTEGER);
                 CREATE TABLE index_name (x INTEGER);
                 CREATE TABLE indexes (x INTEGER);",
            )
            .unwrap();

        let tables = adapter.list_tables("index_").unwrap();
        assert_eq!(tables, vec!["index_name".to_string(), "index_type".to_string()]);
        assert!(adapter.table_exists("indexes").unwrap());
        assert!(!adapter.table_exists("index_missing").unwrap());
        assert!(adapter.table_exists("INDEX_Type").unwrap());
    }

    #[test]
    fn test_file_backed_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.db");

        {
            let adapter = SqliteAdapter::open(&path).unwrap();
            adapter.exec_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
            adapter.execute("INSERT INTO t VALUES (5)", &[]).unwrap();
            assert_eq!(adapter.db_path(), Some(path.as_path()));
        }

        let reopened = SqliteAdapter::open(&path).unwrap();
        let rows = reopened.query("SELECT id FROM t", &[]).unwrap();
        assert_eq!(rows[0].opt_i64(0), Some(5));
    }
}
