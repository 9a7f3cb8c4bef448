//! Storage adapter trait consumed by the graph core.
//!
//! The adapter is the only component that talks to the backing store. The
//! graph layer hands it fully parameterized statements and reads back plain
//! [`Row`]s; connection management, durability and timeouts stay on the
//! adapter's side of this boundary.
//!
//! # Available Implementations
//!
//! | Adapter | Use Case |
//! |---------|----------|
//! | [`SqliteAdapter`](crate::storage::sqlite::SqliteAdapter) | Default; embedded file or in-memory |
//!
//! # Implementor Notes
//!
//! - Methods take `&self` so an adapter can be shared as `Arc<dyn StorageAdapter>`
//! - Placeholders are positional `?`; `params` bind in order of appearance
//! - Every failure maps to [`crate::Error::Storage`] with the failing operation name
//! - The core performs no locking across statements; atomicity of multi-statement
//!   writes is the caller's concern

use crate::Result;
use crate::storage::value::{Row, SqlValue};

/// Minimal statement-execution contract for a relational backing store.
pub trait StorageAdapter: Send + Sync {
    /// Runs a parameterized query and returns every result row.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Runs a parameterized statement and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize>;

    /// Returns the id generated by the most recent successful insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report the id.
    fn last_insert_id(&self) -> Result<i64>;

    /// Runs an insert and returns the id it generated.
    ///
    /// The default runs [`execute`](Self::execute) followed by
    /// [`last_insert_id`](Self::last_insert_id); adapters that can do both in
    /// one round-trip or under one lock should override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64> {
        self.execute(sql, params)?;
        self.last_insert_id()
    }

    /// Runs one or more DDL statements with no parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    fn exec_batch(&self, ddl: &str) -> Result<()>;

    /// Returns `true` if a table with this name exists, compared the way the
    /// backend resolves table names (case-insensitively for `SQLite`).
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn table_exists(&self, name: &str) -> Result<bool>;

    /// Lists table names starting with `prefix`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn list_tables(&self, prefix: &str) -> Result<Vec<String>>;
}
