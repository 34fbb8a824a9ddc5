//! Schema migrations tracked in `PRAGMA user_version`.
//!
//! Each step runs its DDL and bumps the version inside one transaction, so a
//! failed step leaves the schema at the previous version.

pub mod v001_coupling;

use rusqlite::Connection;
use strata_core::errors::StorageError;

use crate::connection::writer::with_immediate_transaction;

/// (target version, SQL) in ascending order.
const MIGRATIONS: &[(u32, &str)] = &[(1, v001_coupling::MIGRATION_SQL)];

/// Newest schema version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|(v, _)| *v).unwrap_or(0)
}

/// Apply every migration newer than the database's current version.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let from = current_version(conn).map_err(|e| StorageError::MigrationFailed {
        version: 0,
        message: e.to_string(),
    })?;

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > from) {
        with_immediate_transaction(conn, |tx| {
            let failed = |e: rusqlite::Error| StorageError::MigrationFailed {
                version,
                message: e.to_string(),
            };
            tx.execute_batch(sql).map_err(failed)?;
            tx.pragma_update(None, "user_version", version).map_err(failed)
        })?;
        tracing::info!(version, "applied storage migration");
    }

    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: format!("user_version: {e}"),
        })
}
