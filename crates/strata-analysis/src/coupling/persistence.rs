//! Mapping analysis results onto storage rows.

use strata_core::errors::{CouplingError, StorageError};
use strata_core::types::collections::FxHashSet;
use strata_storage::queries::coupling::{CycleRow, ModuleMetricsRow, UnusedExportRow};
use strata_storage::queries::runs::{persist_run, RunRecord, RunSummaryRow};
use strata_storage::retention::{prune_runs, RetentionReport};
use strata_storage::DatabaseManager;

use super::analyzer::CouplingAnalysis;

/// Flatten one analysis into the rows of a single run.
pub fn to_run_record(analysis: &CouplingAnalysis) -> Result<RunRecord, CouplingError> {
    let result = &analysis.result;
    let hotspots: FxHashSet<&str> = result.hotspots.iter().map(|h| h.module.as_str()).collect();

    let modules = result
        .metrics
        .iter()
        .map(|m| ModuleMetricsRow {
            module_path: m.module.clone(),
            language: m.language.clone(),
            file_count: m.file_count,
            ca: m.ca,
            ce: m.ce,
            instability: m.instability,
            abstractness: m.abstractness,
            distance: m.distance,
            zone: m.zone.name().to_string(),
            role: m.role.name().to_string(),
            export_count: m.export_count,
            used_exports: m.used_exports,
            unused_exports: m.unused_exports,
            is_hotspot: hotspots.contains(m.module.as_str()),
        })
        .collect();

    let cycles = result
        .cycles
        .iter()
        .enumerate()
        .map(|(position, c)| {
            let break_points = serde_json::to_string(&c.break_points).map_err(|e| StorageError::Serialization {
                field: "break_points".to_string(),
                message: e.to_string(),
            })?;
            Ok(CycleRow {
                cycle_id: c.id.clone(),
                position: position as u32,
                severity: c.severity.name().to_string(),
                size: c.size() as u32,
                files_affected: c.files_affected,
                members: c.members.clone(),
                break_points,
            })
        })
        .collect::<Result<Vec<_>, CouplingError>>()?;

    let unused_exports = result
        .unused_exports
        .iter()
        .map(|u| UnusedExportRow {
            module_path: u.module.clone(),
            name: u.name.clone(),
            kind: u.kind.clone(),
            file: u.file.clone(),
            line: u.line,
        })
        .collect();

    let stats = &result.stats;
    Ok(RunRecord {
        summary: RunSummaryRow {
            id: 0,
            started_at: stats.started_at,
            duration_ms: stats.duration_ms as i64,
            granularity: stats.granularity.name().to_string(),
            backend: stats.backend.name().to_string(),
            cycle_status: stats.cycle_status.name().to_string(),
            files_analyzed: stats.files_analyzed,
            module_count: stats.module_count,
            edge_count: stats.edge_count,
            cycle_count: result.cycles.len() as u32,
            hotspot_count: result.hotspots.len() as u32,
            unused_export_count: result.unused_exports.len() as u32,
            health_score: result.health.score,
        },
        modules,
        cycles,
        unused_exports,
    })
}

/// Write the run atomically and return its id.
pub fn persist(db: &DatabaseManager, analysis: &CouplingAnalysis) -> Result<i64, CouplingError> {
    let record = to_run_record(analysis)?;
    Ok(db.with_writer(|conn| persist_run(conn, &record))?)
}

/// Write the run, then drop runs beyond the newest `retain`. The WAL is
/// truncated after anything was deleted.
pub fn persist_and_prune(
    db: &DatabaseManager,
    analysis: &CouplingAnalysis,
    retain: u32,
) -> Result<(i64, RetentionReport), CouplingError> {
    let run_id = persist(db, analysis)?;
    let report = db.with_writer(|conn| prune_runs(conn, retain))?;
    if report.runs_deleted > 0 {
        db.checkpoint()?;
    }
    Ok((run_id, report))
}
