//! BEGIN IMMEDIATE transactions for the writer connection.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use strata_core::errors::StorageError;

/// Execute `f` inside a BEGIN IMMEDIATE transaction.
///
/// The write lock is taken at transaction start so a concurrent writer fails
/// fast with SQLITE_BUSY instead of mid-run. Any error from `f` drops the
/// transaction, which rolls it back.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, StorageError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(|e| {
        StorageError::SqliteError {
            message: format!("failed to begin immediate transaction: {e}"),
        }
    })?;

    let result = f(&tx)?;

    tx.commit().map_err(|e| StorageError::SqliteError {
        message: format!("failed to commit: {e}"),
    })?;

    Ok(result)
}
