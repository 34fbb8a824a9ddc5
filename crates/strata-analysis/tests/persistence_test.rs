//! Analysis results written to SQLite and read back through the query layer.

use strata_analysis::coupling::persistence::{persist, persist_and_prune, to_run_record};
use strata_analysis::coupling::*;
use strata_core::config::{CouplingConfig, Granularity};
use strata_storage::queries::coupling::{
    get_module, list_cycles, list_hotspots, list_modules, list_unused_exports, CouplingFilter,
};
use strata_storage::queries::runs::{count_runs, get_run, latest_run};
use strata_storage::DatabaseManager;
use tempfile::TempDir;

fn unresolved(_: &str, _: &str) -> Option<String> {
    None
}

/// a → b → c → a, with d importing all three.
fn analysis() -> CouplingAnalysis {
    let import = |target: &str, symbol: &str| ImportFact::new(format!("./{symbol}"), &[symbol]).resolved(target);
    let files = vec![
        FileFacts::new("src/a.ts")
            .with_import(import("src/b.ts", "b"))
            .with_export(ExportFact::new("a", ExportKind::Function)),
        FileFacts::new("src/b.ts")
            .with_import(import("src/c.ts", "c"))
            .with_export(ExportFact::new("b", ExportKind::Class)),
        FileFacts::new("src/c.ts")
            .with_import(import("src/a.ts", "a"))
            .with_export(ExportFact::new("c", ExportKind::Interface))
            .with_export(ExportFact::new("legacyC", ExportKind::Function).at_line(12)),
        FileFacts::new("src/d.ts")
            .with_import(import("src/a.ts", "a"))
            .with_import(import("src/b.ts", "b"))
            .with_import(import("src/c.ts", "c")),
    ];
    let config = CouplingConfig {
        granularity: Some(Granularity::File),
        ..CouplingConfig::default()
    };
    CouplingAnalyzer::new(config).analyze(&files, &unresolved)
}

#[test]
fn run_record_mirrors_result() {
    let analysis = analysis();
    let record = to_run_record(&analysis).unwrap();

    assert_eq!(record.modules.len(), 4);
    assert_eq!(record.summary.granularity, "file");
    assert_eq!(record.summary.backend, "in_memory");
    assert_eq!(record.summary.cycle_status, "complete");
    assert_eq!(record.summary.cycle_count, 1);
    assert_eq!(record.summary.health_score, analysis.result.health.score);
    assert!(record.modules.iter().all(|m| m.is_hotspot));

    let cycle = &record.cycles[0];
    assert_eq!(cycle.members, analysis.result.cycles[0].members);
    let break_points: Vec<BreakPoint> = serde_json::from_str(&cycle.break_points).unwrap();
    assert_eq!(break_points.len(), 3);
    assert_eq!(break_points[0].from, analysis.result.cycles[0].break_points[0].from);
}

#[test]
fn persisted_run_is_queryable() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let analysis = analysis();
    let run_id = persist(&db, &analysis).unwrap();

    db.with_reader(|conn| {
        let summary = get_run(conn, run_id)?.unwrap();
        assert_eq!(summary.module_count, 4);
        assert_eq!(summary.edge_count, analysis.result.stats.edge_count);

        let modules = list_modules(conn, run_id, &CouplingFilter::default(), None, 10)?;
        assert_eq!(modules.total, 4);
        assert_eq!(modules.items[0].module_path, "src/a.ts");

        let d = get_module(conn, run_id, "src/d.ts")?.unwrap();
        assert_eq!((d.ca, d.ce), (0, 3));

        let hotspots = list_hotspots(conn, run_id, &CouplingFilter::default(), None, 2)?;
        assert_eq!(hotspots.total, analysis.result.hotspots.len() as u64);
        assert!(hotspots.has_more);

        let cycles = list_cycles(conn, run_id, &CouplingFilter::default().with_severity("medium"), None, 10)?;
        assert_eq!(cycles.items.len(), 1);
        assert_eq!(cycles.items[0].cycle_id, analysis.result.cycles[0].id);

        let unused = list_unused_exports(conn, run_id, &CouplingFilter::default(), None, 10)?;
        assert_eq!(unused.total, 1);
        assert_eq!(unused.items[0].name, "legacyC");
        assert_eq!(unused.items[0].line, 12);
        Ok(())
    })
    .unwrap();
}

#[test]
fn retention_keeps_newest_runs() {
    let dir = TempDir::new().unwrap();
    let db = DatabaseManager::open(&dir.path().join("strata.db")).unwrap();
    let analysis = analysis();

    for _ in 0..3 {
        persist(&db, &analysis).unwrap();
    }
    let (latest_id, report) = persist_and_prune(&db, &analysis, 2).unwrap();
    assert_eq!(report.runs_deleted, 2);
    let wal = std::fs::metadata(dir.path().join("strata.db-wal")).unwrap();
    assert_eq!(wal.len(), 0);

    db.with_reader(|conn| {
        assert_eq!(count_runs(conn)?, 2);
        assert_eq!(latest_run(conn)?.map(|r| r.id), Some(latest_id));
        let modules = list_modules(conn, latest_id, &CouplingFilter::default(), None, 10)?;
        assert_eq!(modules.total, 4);
        Ok(())
    })
    .unwrap();
}
