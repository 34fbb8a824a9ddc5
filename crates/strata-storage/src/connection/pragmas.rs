//! Connection pragmas. Writers get WAL with NORMAL sync; readers are
//! query-only. Both share the cache, busy timeout and temp store settings.

use rusqlite::Connection;
use strata_core::errors::StorageError;

const SHARED: &str = "
    PRAGMA cache_size = -64000;
    PRAGMA busy_timeout = 5000;
    PRAGMA temp_store = MEMORY;
";

fn apply(conn: &Connection, role: &str, specific: &str) -> Result<(), StorageError> {
    conn.execute_batch(&format!("{specific}{SHARED}"))
        .map_err(|e| StorageError::SqliteError {
            message: format!("{role} pragmas: {e}"),
        })
}

/// Pragmas for the single writer connection. Coupling child tables cascade
/// on run deletion, so foreign keys stay on.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    apply(
        conn,
        "writer",
        "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;",
    )
}

pub fn apply_read_pragmas(conn: &Connection) -> Result<(), StorageError> {
    apply(conn, "reader", "PRAGMA query_only = ON;")
}

/// True when the connection's journal is in WAL mode. In-memory databases
/// report `memory` and return false.
pub fn verify_wal_mode(conn: &Connection) -> Result<bool, StorageError> {
    conn.pragma_query_value(None, "journal_mode", |row| row.get::<_, String>(0))
        .map(|mode| mode.eq_ignore_ascii_case("wal"))
        .map_err(|e| StorageError::SqliteError {
            message: format!("journal_mode: {e}"),
        })
}
