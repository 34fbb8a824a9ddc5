//! Run summaries and the all-or-nothing run writer.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use strata_core::errors::StorageError;

use super::coupling::{
    insert_cycle, insert_module_metrics, insert_unused_export, CycleRow, ModuleMetricsRow,
    UnusedExportRow,
};
use crate::connection::sqlite_err;
use crate::connection::writer::with_immediate_transaction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummaryRow {
    /// Assigned on insert; ignored when persisting.
    pub id: i64,
    pub started_at: i64,
    pub duration_ms: i64,
    pub granularity: String,
    pub backend: String,
    pub cycle_status: String,
    pub files_analyzed: u32,
    pub module_count: u32,
    pub edge_count: u32,
    pub cycle_count: u32,
    pub hotspot_count: u32,
    pub unused_export_count: u32,
    pub health_score: f64,
}

/// Everything one run writes.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub summary: RunSummaryRow,
    pub modules: Vec<ModuleMetricsRow>,
    pub cycles: Vec<CycleRow>,
    pub unused_exports: Vec<UnusedExportRow>,
}

/// Persist a full run in one IMMEDIATE transaction and return its id.
///
/// Any failure rolls back every row of the run, so readers never observe a
/// partial run and earlier runs are untouched.
pub fn persist_run(conn: &Connection, record: &RunRecord) -> Result<i64, StorageError> {
    let result = with_immediate_transaction(conn, |tx| {
        let run_id = insert_summary(tx, &record.summary)?;
        for module in &record.modules {
            insert_module_metrics(tx, run_id, module)?;
        }
        for cycle in &record.cycles {
            insert_cycle(tx, run_id, cycle)?;
        }
        for export in &record.unused_exports {
            insert_unused_export(tx, run_id, export)?;
        }
        Ok(run_id)
    });

    match result {
        Ok(run_id) => {
            tracing::info!(
                run_id,
                modules = record.modules.len(),
                cycles = record.cycles.len(),
                unused_exports = record.unused_exports.len(),
                "persisted coupling run"
            );
            Ok(run_id)
        }
        Err(e) => {
            tracing::error!(error = %e, "coupling run rolled back");
            Err(StorageError::TransactionFailed {
                message: e.to_string(),
            })
        }
    }
}

fn insert_summary(conn: &Connection, s: &RunSummaryRow) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO coupling_runs
            (started_at, duration_ms, granularity, backend, cycle_status, files_analyzed,
             module_count, edge_count, cycle_count, hotspot_count, unused_export_count,
             health_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            s.started_at,
            s.duration_ms,
            s.granularity,
            s.backend,
            s.cycle_status,
            s.files_analyzed,
            s.module_count,
            s.edge_count,
            s.cycle_count,
            s.hotspot_count,
            s.unused_export_count,
            s.health_score,
        ],
    )
    .map_err(sqlite_err)?;
    Ok(conn.last_insert_rowid())
}

const SUMMARY_COLUMNS: &str = "id, started_at, duration_ms, granularity, backend, cycle_status,
    files_analyzed, module_count, edge_count, cycle_count, hotspot_count, unused_export_count,
    health_score";

fn map_summary(row: &Row<'_>) -> rusqlite::Result<RunSummaryRow> {
    Ok(RunSummaryRow {
        id: row.get(0)?,
        started_at: row.get(1)?,
        duration_ms: row.get(2)?,
        granularity: row.get(3)?,
        backend: row.get(4)?,
        cycle_status: row.get(5)?,
        files_analyzed: row.get(6)?,
        module_count: row.get(7)?,
        edge_count: row.get(8)?,
        cycle_count: row.get(9)?,
        hotspot_count: row.get(10)?,
        unused_export_count: row.get(11)?,
        health_score: row.get(12)?,
    })
}

pub fn get_run(conn: &Connection, run_id: i64) -> Result<Option<RunSummaryRow>, StorageError> {
    let sql = format!("SELECT {SUMMARY_COLUMNS} FROM coupling_runs WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    stmt.query_row(params![run_id], map_summary)
        .optional()
        .map_err(sqlite_err)
}

/// The most recently persisted run.
pub fn latest_run(conn: &Connection) -> Result<Option<RunSummaryRow>, StorageError> {
    let sql = format!("SELECT {SUMMARY_COLUMNS} FROM coupling_runs ORDER BY id DESC LIMIT 1");
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    stmt.query_row([], map_summary).optional().map_err(sqlite_err)
}

/// Runs newest first.
pub fn list_runs(conn: &Connection, limit: usize) -> Result<Vec<RunSummaryRow>, StorageError> {
    let sql = format!("SELECT {SUMMARY_COLUMNS} FROM coupling_runs ORDER BY id DESC LIMIT ?1");
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params![limit as i64], map_summary)
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

pub fn count_runs(conn: &Connection) -> Result<u64, StorageError> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM coupling_runs", [], |row| row.get(0))
        .map_err(sqlite_err)?;
    Ok(n.max(0) as u64)
}
