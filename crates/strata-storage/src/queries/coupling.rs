//! Per-run coupling rows: module metrics, cycles, unused exports.
//!
//! List queries are keyset-paginated and share one filter type. The sort
//! order of each list is fixed so cursors stay valid across calls.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use strata_core::errors::StorageError;

use crate::connection::sqlite_err;
use crate::pagination::{PaginatedResult, PaginationCursor};

// ─── Rows ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetricsRow {
    pub module_path: String,
    pub language: Option<String>,
    pub file_count: u32,
    pub ca: u32,
    pub ce: u32,
    pub instability: f64,
    pub abstractness: f64,
    pub distance: f64,
    pub zone: String,
    pub role: String,
    pub export_count: u32,
    pub used_exports: u32,
    pub unused_exports: u32,
    pub is_hotspot: bool,
}

impl ModuleMetricsRow {
    pub fn total_coupling(&self) -> u32 {
        self.ca + self.ce
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRow {
    pub cycle_id: String,
    /// Rank in the run's severity ordering, 0 first.
    pub position: u32,
    pub severity: String,
    pub size: u32,
    pub files_affected: u32,
    pub members: Vec<String>,
    /// Break points serialized as a JSON array.
    pub break_points: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedExportRow {
    pub module_path: String,
    pub name: String,
    pub kind: String,
    pub file: String,
    pub line: u32,
}

/// Filters shared by the list queries. `None` means no constraint.
#[derive(Debug, Clone, Default)]
pub struct CouplingFilter {
    pub zone: Option<String>,
    pub role: Option<String>,
    pub severity: Option<String>,
    pub path_prefix: Option<String>,
}

impl CouplingFilter {
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }
}

/// A WHERE clause under construction with positional parameters.
struct Clause {
    sql: String,
    params: Vec<Value>,
}

impl Clause {
    fn new(run_id: i64) -> Self {
        Self {
            sql: "run_id = ?".to_string(),
            params: vec![Value::Integer(run_id)],
        }
    }

    fn and(&mut self, fragment: &str, values: impl IntoIterator<Item = Value>) {
        self.sql.push_str(" AND ");
        self.sql.push_str(fragment);
        self.params.extend(values);
    }

    fn path_prefix(&mut self, column: &str, prefix: &Option<String>) {
        if let Some(prefix) = prefix {
            // substr instead of LIKE so `%` and `_` in paths match literally.
            self.and(
                &format!("substr({column}, 1, length(?)) = ?"),
                [Value::Text(prefix.clone()), Value::Text(prefix.clone())],
            );
        }
    }
}

fn count(conn: &Connection, table: &str, clause: &Clause) -> Result<u64, StorageError> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {}", clause.sql);
    let n: i64 = conn
        .query_row(&sql, params_from_iter(clause.params.iter()), |row| row.get(0))
        .map_err(sqlite_err)?;
    Ok(n.max(0) as u64)
}

fn collect_rows<T, F>(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    map: F,
) -> Result<Vec<T>, StorageError>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare_cached(sql).map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), map)
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_err)
}

fn decode_cursor(cursor: Option<&str>) -> Option<PaginationCursor> {
    cursor.and_then(|c| {
        let decoded = PaginationCursor::decode(c);
        if decoded.is_none() {
            tracing::debug!(cursor = c, "ignoring malformed pagination cursor");
        }
        decoded
    })
}

// ─── Inserts (called inside the run transaction) ─────────────────────

pub(crate) fn insert_module_metrics(
    conn: &Connection,
    run_id: i64,
    row: &ModuleMetricsRow,
) -> Result<(), StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO coupling_module_metrics
                (run_id, module_path, language, file_count, ca, ce, instability,
                 abstractness, distance, zone, role, export_count, used_exports,
                 unused_exports, is_hotspot)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .map_err(sqlite_err)?;
    stmt.execute(params![
        run_id,
        row.module_path,
        row.language,
        row.file_count,
        row.ca,
        row.ce,
        row.instability,
        row.abstractness,
        row.distance,
        row.zone,
        row.role,
        row.export_count,
        row.used_exports,
        row.unused_exports,
        row.is_hotspot,
    ])
    .map_err(sqlite_err)?;
    Ok(())
}

pub(crate) fn insert_cycle(conn: &Connection, run_id: i64, row: &CycleRow) -> Result<(), StorageError> {
    let members = serde_json::to_string(&row.members).map_err(|e| StorageError::Serialization {
        field: "coupling_cycles.members".to_string(),
        message: e.to_string(),
    })?;
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO coupling_cycles
                (run_id, cycle_id, position, severity, size, files_affected, members, break_points)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .map_err(sqlite_err)?;
    stmt.execute(params![
        run_id,
        row.cycle_id,
        row.position,
        row.severity,
        row.size,
        row.files_affected,
        members,
        row.break_points,
    ])
    .map_err(sqlite_err)?;
    Ok(())
}

pub(crate) fn insert_unused_export(
    conn: &Connection,
    run_id: i64,
    row: &UnusedExportRow,
) -> Result<(), StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO coupling_unused_exports (run_id, module_path, name, kind, file, line)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(sqlite_err)?;
    stmt.execute(params![run_id, row.module_path, row.name, row.kind, row.file, row.line])
        .map_err(sqlite_err)?;
    Ok(())
}

// ─── Module metrics ──────────────────────────────────────────────────

const MODULE_COLUMNS: &str = "module_path, language, file_count, ca, ce, instability,
    abstractness, distance, zone, role, export_count, used_exports, unused_exports, is_hotspot";

fn map_module(row: &Row<'_>) -> rusqlite::Result<ModuleMetricsRow> {
    Ok(ModuleMetricsRow {
        module_path: row.get(0)?,
        language: row.get(1)?,
        file_count: row.get(2)?,
        ca: row.get(3)?,
        ce: row.get(4)?,
        instability: row.get(5)?,
        abstractness: row.get(6)?,
        distance: row.get(7)?,
        zone: row.get(8)?,
        role: row.get(9)?,
        export_count: row.get(10)?,
        used_exports: row.get(11)?,
        unused_exports: row.get(12)?,
        is_hotspot: row.get(13)?,
    })
}

fn module_clause(run_id: i64, filter: &CouplingFilter) -> Clause {
    let mut clause = Clause::new(run_id);
    if let Some(zone) = &filter.zone {
        clause.and("zone = ?", [Value::Text(zone.clone())]);
    }
    if let Some(role) = &filter.role {
        clause.and("role = ?", [Value::Text(role.clone())]);
    }
    clause.path_prefix("module_path", &filter.path_prefix);
    clause
}

/// Metrics for one module in a run.
pub fn get_module(
    conn: &Connection,
    run_id: i64,
    module_path: &str,
) -> Result<Option<ModuleMetricsRow>, StorageError> {
    let sql = format!(
        "SELECT {MODULE_COLUMNS} FROM coupling_module_metrics
         WHERE run_id = ?1 AND module_path = ?2"
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    stmt.query_row(params![run_id, module_path], map_module)
        .optional()
        .map_err(sqlite_err)
}

/// Modules ordered by path. Filters: zone, role, path prefix.
pub fn list_modules(
    conn: &Connection,
    run_id: i64,
    filter: &CouplingFilter,
    cursor: Option<&str>,
    limit: usize,
) -> Result<PaginatedResult<ModuleMetricsRow>, StorageError> {
    let mut clause = module_clause(run_id, filter);
    let total = count(conn, "coupling_module_metrics", &clause)?;

    if let Some(cursor) = decode_cursor(cursor) {
        clause.and("module_path > ?", [Value::Text(cursor.last_id)]);
    }
    let sql = format!(
        "SELECT {MODULE_COLUMNS} FROM coupling_module_metrics
         WHERE {} ORDER BY module_path ASC LIMIT {}",
        clause.sql,
        limit + 1
    );
    let rows = collect_rows(conn, &sql, &clause.params, map_module)?;
    Ok(PaginatedResult::from_overfetch(rows, limit, total, |m| {
        PaginationCursor::new(m.module_path.clone(), m.module_path.clone())
    }))
}

/// Hotspots ordered by Ca + Ce descending, then path.
pub fn list_hotspots(
    conn: &Connection,
    run_id: i64,
    filter: &CouplingFilter,
    cursor: Option<&str>,
    limit: usize,
) -> Result<PaginatedResult<ModuleMetricsRow>, StorageError> {
    let mut clause = module_clause(run_id, filter);
    clause.and("is_hotspot = 1", std::iter::empty());
    let total = count(conn, "coupling_module_metrics", &clause)?;

    if let Some(cursor) = decode_cursor(cursor) {
        let last_total: i64 = cursor.last_sort_value.parse().unwrap_or(i64::MAX);
        clause.and(
            "((ca + ce) < ? OR ((ca + ce) = ? AND module_path > ?))",
            [
                Value::Integer(last_total),
                Value::Integer(last_total),
                Value::Text(cursor.last_id),
            ],
        );
    }
    let sql = format!(
        "SELECT {MODULE_COLUMNS} FROM coupling_module_metrics
         WHERE {} ORDER BY (ca + ce) DESC, module_path ASC LIMIT {}",
        clause.sql,
        limit + 1
    );
    let rows = collect_rows(conn, &sql, &clause.params, map_module)?;
    Ok(PaginatedResult::from_overfetch(rows, limit, total, |m| {
        PaginationCursor::new(m.total_coupling().to_string(), m.module_path.clone())
    }))
}

// ─── Cycles ──────────────────────────────────────────────────────────

fn map_cycle(row: &Row<'_>) -> rusqlite::Result<CycleRow> {
    let members_json: String = row.get(6)?;
    let members: Vec<String> = serde_json::from_str(&members_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(CycleRow {
        cycle_id: row.get(0)?,
        position: row.get(1)?,
        severity: row.get(2)?,
        size: row.get(3)?,
        files_affected: row.get(4)?,
        break_points: row.get(5)?,
        members,
    })
}

/// Cycles in severity order. Filters: severity, path prefix on any member.
pub fn list_cycles(
    conn: &Connection,
    run_id: i64,
    filter: &CouplingFilter,
    cursor: Option<&str>,
    limit: usize,
) -> Result<PaginatedResult<CycleRow>, StorageError> {
    let mut clause = Clause::new(run_id);
    if let Some(severity) = &filter.severity {
        clause.and("severity = ?", [Value::Text(severity.clone())]);
    }
    if let Some(prefix) = &filter.path_prefix {
        clause.and(
            "EXISTS (SELECT 1 FROM json_each(coupling_cycles.members) m
                     WHERE substr(m.value, 1, length(?)) = ?)",
            [Value::Text(prefix.clone()), Value::Text(prefix.clone())],
        );
    }
    let total = count(conn, "coupling_cycles", &clause)?;

    if let Some(cursor) = decode_cursor(cursor) {
        let last_position: i64 = cursor.last_sort_value.parse().unwrap_or(i64::MAX);
        clause.and("position > ?", [Value::Integer(last_position)]);
    }
    let sql = format!(
        "SELECT cycle_id, position, severity, size, files_affected, break_points, members
         FROM coupling_cycles WHERE {} ORDER BY position ASC LIMIT {}",
        clause.sql,
        limit + 1
    );
    let rows = collect_rows(conn, &sql, &clause.params, map_cycle)?;
    Ok(PaginatedResult::from_overfetch(rows, limit, total, |c| {
        PaginationCursor::new(c.position.to_string(), c.cycle_id.clone())
    }))
}

// ─── Unused exports ──────────────────────────────────────────────────

/// Unused exports in insertion order. Filter: path prefix on the module.
pub fn list_unused_exports(
    conn: &Connection,
    run_id: i64,
    filter: &CouplingFilter,
    cursor: Option<&str>,
    limit: usize,
) -> Result<PaginatedResult<UnusedExportRow>, StorageError> {
    let mut clause = Clause::new(run_id);
    clause.path_prefix("module_path", &filter.path_prefix);
    let total = count(conn, "coupling_unused_exports", &clause)?;

    if let Some(cursor) = decode_cursor(cursor) {
        let last_id: i64 = cursor.last_id.parse().unwrap_or(i64::MAX);
        clause.and("id > ?", [Value::Integer(last_id)]);
    }
    let sql = format!(
        "SELECT id, module_path, name, kind, file, line FROM coupling_unused_exports
         WHERE {} ORDER BY id ASC LIMIT {}",
        clause.sql,
        limit + 1
    );
    let rows = collect_rows(conn, &sql, &clause.params, |row| {
        Ok((
            row.get::<_, i64>(0)?,
            UnusedExportRow {
                module_path: row.get(1)?,
                name: row.get(2)?,
                kind: row.get(3)?,
                file: row.get(4)?,
                line: row.get(5)?,
            },
        ))
    })?;
    let page = PaginatedResult::from_overfetch(rows, limit, total, |(id, row)| {
        PaginationCursor::new(row.module_path.clone(), id.to_string())
    });
    Ok(PaginatedResult {
        items: page.items.into_iter().map(|(_, row)| row).collect(),
        total: page.total,
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    })
}
