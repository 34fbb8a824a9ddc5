//! Backend selection, relational/in-memory agreement and degradation.

use strata_analysis::coupling::backend::{CouplingBackend, InMemoryBackend, RelationalBackend, SccResult};
use strata_analysis::coupling::graph::{DependencyEdge, ModuleNode};
use strata_analysis::coupling::martin_metrics::CouplingCounts;
use strata_analysis::coupling::*;
use strata_core::config::{CouplingConfig, Granularity};
use strata_core::errors::CouplingError;

fn config(backend_threshold: usize) -> CouplingConfig {
    CouplingConfig {
        granularity: Some(Granularity::File),
        backend_threshold: Some(backend_threshold),
        ..CouplingConfig::default()
    }
}

fn edge(from: &str, to: &str) -> FileFacts {
    FileFacts::new(from).with_import(ImportFact::new(format!("./{to}"), &["x"]).resolved(to))
}

/// Two cycles (a-b-c and d-e), a self-importing module, and a tail.
fn graph_files() -> Vec<FileFacts> {
    vec![
        edge("a.ts", "b.ts"),
        edge("b.ts", "c.ts").with_import(ImportFact::new("./f", &["f"]).resolved("f.ts")),
        edge("c.ts", "a.ts"),
        edge("d.ts", "e.ts"),
        edge("e.ts", "d.ts"),
        FileFacts::new("f.ts"),
        FileFacts::new("g.ts").with_import(ImportFact::new("./g", &["g"]).resolved("g.ts")),
    ]
}

fn none(_: &str, _: &str) -> Option<String> {
    None
}

#[test]
fn threshold_selects_relational_backend() {
    let small = CouplingAnalyzer::new(config(100)).analyze(&graph_files(), &none);
    assert_eq!(small.result.stats.backend, BackendKind::InMemory);

    let large = CouplingAnalyzer::new(config(3)).analyze(&graph_files(), &none);
    assert_eq!(large.result.stats.backend, BackendKind::Relational);
    assert_eq!(
        large.result.stats.cycle_status,
        CycleStatus::Approximate { max_depth: 10 }
    );
}

#[test]
fn relational_agrees_with_in_memory_within_depth() {
    let exact = CouplingAnalyzer::new(config(100)).analyze(&graph_files(), &none);
    let approx = CouplingAnalyzer::new(config(1)).analyze(&graph_files(), &none);

    assert_eq!(exact.result.metrics, approx.result.metrics);
    let ids = |a: &CouplingAnalysis| {
        let mut ids: Vec<String> = a.result.cycles.iter().map(|c| c.id.clone()).collect();
        ids.sort();
        ids
    };
    assert_eq!(ids(&exact), ids(&approx));
    // a-b-c and d-e; self-imports are dropped by the builder.
    assert_eq!(exact.result.cycles.len(), 2);
}

#[test]
fn relational_counts_exclude_self_loops() {
    let mut graph = ModuleGraph::new();
    let a = graph.add_module(ModuleNode::new("a"));
    let b = graph.add_module(ModuleNode::new("b"));
    let dep = || DependencyEdge {
        symbols: Default::default(),
        is_type_only: false,
        file: "a".to_string(),
        line: 1,
    };
    graph.add_edge(a, b, dep());
    graph.add_edge(a, b, dep());
    graph.add_edge(a, a, dep());

    let relational = RelationalBackend::open(10).expect("open");
    let counts = relational.coupling_counts(&graph).expect("counts");
    assert_eq!(counts.get(&a), Some(&(0, 1)));
    assert_eq!(counts.get(&b), Some(&(1, 0)));
    assert_eq!(counts, InMemoryBackend.coupling_counts(&graph).expect("counts"));

    let scc = relational.strongly_connected(&graph).expect("scc");
    assert_eq!(scc.components, vec![vec![a]]);
}

#[test]
fn cycles_longer_than_depth_are_missed() {
    let files: Vec<FileFacts> = (0..6)
        .map(|i| edge(&format!("m{i}.ts"), &format!("m{}.ts", (i + 1) % 6)))
        .collect();
    let shallow = CouplingAnalyzer::new(CouplingConfig {
        relational_max_depth: Some(2),
        ..config(1)
    })
    .analyze(&files, &none);
    assert!(shallow.result.cycles.is_empty());
    assert_eq!(
        shallow.result.stats.cycle_status,
        CycleStatus::Approximate { max_depth: 2 }
    );

    let deep = CouplingAnalyzer::new(config(1)).analyze(&files, &none);
    assert_eq!(deep.result.cycles.len(), 1);
    assert_eq!(deep.result.cycles[0].severity, CycleSeverity::Critical);
}

struct BrokenBackend;

impl CouplingBackend for BrokenBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn coupling_counts(&self, _graph: &ModuleGraph) -> Result<CouplingCounts, CouplingError> {
        Err(CouplingError::Backend {
            message: "no such table: strata_edges".to_string(),
        })
    }

    fn strongly_connected(&self, _graph: &ModuleGraph) -> Result<SccResult, CouplingError> {
        Err(CouplingError::BackendUnavailable {
            backend: "relational".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

#[test]
fn backend_failure_degrades_to_metrics_only() {
    let exact = CouplingAnalyzer::new(config(100)).analyze(&graph_files(), &none);
    let degraded = CouplingAnalyzer::new(config(100))
        .with_backend(Box::new(BrokenBackend))
        .analyze(&graph_files(), &none);

    assert!(degraded.result.cycles.is_empty());
    match &degraded.result.stats.cycle_status {
        CycleStatus::Skipped { reason } => assert!(reason.contains("connection refused")),
        other => panic!("expected skipped, got {other:?}"),
    }
    assert_eq!(degraded.result.metrics, exact.result.metrics);
    assert_eq!(degraded.result.health.cycle_penalty, 0.0);
}
