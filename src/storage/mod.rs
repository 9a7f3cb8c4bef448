//! Storage layer.
//!
//! Everything below the graph core: the [`StorageAdapter`] contract, the
//! typed values that cross it, SELECT assembly, the table layout, and the
//! bundled `SQLite` adapter.
//!
//! ```text
//! Graph ─┬─ Node / Edge ─┐
//!        ├─ traversal ───┼─► query_builder ─► StorageAdapter ─► SqliteAdapter
//!        └─ IndexManager ┘
//! ```

// Allow significant_drop_tightening - releasing the connection guard a few
// statements early buys nothing.
#![allow(clippy::significant_drop_tightening)]

pub mod query_builder;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod value;

pub use query_builder::{JoinKind, SelectBuilder, Statement};
pub use schema::ensure_schema;
pub use sqlite::SqliteAdapter;
pub use traits::StorageAdapter;
pub use value::{Row, SqlValue};
