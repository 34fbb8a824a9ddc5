//! V001 migration: coupling run tables.
//!
//! Tables: coupling_runs, coupling_module_metrics, coupling_cycles,
//!         coupling_unused_exports.

pub const MIGRATION_SQL: &str = r#"
-- One summary row per persisted run
CREATE TABLE IF NOT EXISTS coupling_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at INTEGER NOT NULL,
    duration_ms INTEGER NOT NULL,
    granularity TEXT NOT NULL,
    backend TEXT NOT NULL,
    cycle_status TEXT NOT NULL,
    files_analyzed INTEGER NOT NULL,
    module_count INTEGER NOT NULL,
    edge_count INTEGER NOT NULL,
    cycle_count INTEGER NOT NULL,
    hotspot_count INTEGER NOT NULL,
    unused_export_count INTEGER NOT NULL,
    health_score REAL NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
) STRICT;

-- Martin metrics, zone and role per module per run
CREATE TABLE IF NOT EXISTS coupling_module_metrics (
    run_id INTEGER NOT NULL REFERENCES coupling_runs(id) ON DELETE CASCADE,
    module_path TEXT NOT NULL,
    language TEXT,
    file_count INTEGER NOT NULL,
    ca INTEGER NOT NULL,
    ce INTEGER NOT NULL,
    instability REAL NOT NULL,
    abstractness REAL NOT NULL,
    distance REAL NOT NULL,
    zone TEXT NOT NULL,
    role TEXT NOT NULL,
    export_count INTEGER NOT NULL,
    used_exports INTEGER NOT NULL,
    unused_exports INTEGER NOT NULL,
    is_hotspot INTEGER NOT NULL,
    PRIMARY KEY (run_id, module_path)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_coupling_module_metrics_zone
    ON coupling_module_metrics(run_id, zone);
CREATE INDEX IF NOT EXISTS idx_coupling_module_metrics_role
    ON coupling_module_metrics(run_id, role);
CREATE INDEX IF NOT EXISTS idx_coupling_module_metrics_hotspot
    ON coupling_module_metrics(run_id, is_hotspot, ca, ce);

-- Detected cycles; members and break points are JSON arrays
CREATE TABLE IF NOT EXISTS coupling_cycles (
    run_id INTEGER NOT NULL REFERENCES coupling_runs(id) ON DELETE CASCADE,
    cycle_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    severity TEXT NOT NULL,
    size INTEGER NOT NULL,
    files_affected INTEGER NOT NULL,
    members TEXT NOT NULL,
    break_points TEXT NOT NULL,
    PRIMARY KEY (run_id, cycle_id)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_coupling_cycles_position
    ON coupling_cycles(run_id, position);

-- Exports nobody imports
CREATE TABLE IF NOT EXISTS coupling_unused_exports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES coupling_runs(id) ON DELETE CASCADE,
    module_path TEXT NOT NULL,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    file TEXT NOT NULL,
    line INTEGER NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_coupling_unused_exports_run
    ON coupling_unused_exports(run_id, module_path);
"#;
