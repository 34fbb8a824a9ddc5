//! Run retention: keep the newest N runs, delete the rest.

use rusqlite::{params, Connection};
use serde::Serialize;
use strata_core::errors::StorageError;

use crate::connection::sqlite_err;
use crate::connection::writer::with_immediate_transaction;

/// Report of what was cleaned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionReport {
    pub runs_deleted: u64,
    pub rows_deleted: u64,
    pub duration_ms: u64,
}

/// Child tables cleared explicitly so pruning does not depend on the
/// connection having `foreign_keys` enabled.
const CHILD_TABLES: &[&str] = &[
    "coupling_module_metrics",
    "coupling_cycles",
    "coupling_unused_exports",
];

/// Delete every run older than the newest `keep` runs, in one transaction.
pub fn prune_runs(conn: &Connection, keep: u32) -> Result<RetentionReport, StorageError> {
    let start = std::time::Instant::now();

    let mut report = with_immediate_transaction(conn, |tx| {
        let cutoff: Option<i64> = tx
            .query_row(
                "SELECT id FROM coupling_runs ORDER BY id DESC LIMIT 1 OFFSET ?1",
                params![keep],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(sqlite_err(other)),
            })?;

        let mut report = RetentionReport::default();
        let Some(cutoff) = cutoff else {
            return Ok(report);
        };

        for table in CHILD_TABLES {
            let deleted = tx
                .execute(&format!("DELETE FROM {table} WHERE run_id <= ?1"), params![cutoff])
                .map_err(sqlite_err)?;
            report.rows_deleted += deleted as u64;
        }
        report.runs_deleted = tx
            .execute("DELETE FROM coupling_runs WHERE id <= ?1", params![cutoff])
            .map_err(sqlite_err)? as u64;
        Ok(report)
    })?;

    report.duration_ms = start.elapsed().as_millis() as u64;
    if report.runs_deleted > 0 {
        tracing::info!(
            runs_deleted = report.runs_deleted,
            rows_deleted = report.rows_deleted,
            keep,
            "pruned coupling runs"
        );
    }
    Ok(report)
}
