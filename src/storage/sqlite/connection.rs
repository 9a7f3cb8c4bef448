//! Connection handling for the `SQLite` adapter.
//!
//! One `Mutex<Connection>` per adapter, poison recovery on lock, and the
//! pragmas the graph tables rely on.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Default `busy_timeout` applied to new connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Acquires the connection lock, recovering from poison.
///
/// A panic inside a previous critical section leaves the connection itself
/// usable, so the guard is recovered and the event logged instead of
/// propagating the panic to every later caller.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Applies journal, sync and timeout pragmas.
///
/// - **WAL mode**: concurrent readers with a single writer (file databases only;
///   in-memory databases report `memory`)
/// - **NORMAL synchronous**
/// - **`busy_timeout`**: wait for locks instead of failing with `SQLITE_BUSY`
///
/// # Errors
///
/// Returns [`Error::Storage`] if the busy timeout cannot be set.
pub fn configure_connection(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    // journal_mode returns a row, so a failure here is not fatal
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    conn.busy_timeout(busy_timeout)
        .map_err(|e| Error::Storage {
            operation: "configure_connection".to_string(),
            cause: e.to_string(),
        })?;

    Ok(())
}
