//! Property tests over randomly generated module graphs.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use proptest::prelude::*;
use strata_analysis::coupling::*;
use strata_core::config::{CouplingConfig, Granularity};
use strata_core::types::collections::FxHashSet;

const KINDS: &[ExportKind] = &[
    ExportKind::Function,
    ExportKind::Class,
    ExportKind::Interface,
    ExportKind::Trait,
    ExportKind::Constant,
];

fn module_path(i: usize) -> String {
    format!("src/m{i:02}.ts")
}

/// Random graph spec: module count, edges by index, export kinds per module.
fn graph_spec() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<Vec<usize>>)> {
    (2usize..14).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..n * 3),
            prop::collection::vec(prop::collection::vec(0..KINDS.len(), 0..4), n),
        )
    })
}

fn files_for(n: usize, edges: &[(usize, usize)], exports: &[Vec<usize>]) -> Vec<FileFacts> {
    (0..n)
        .map(|i| {
            let mut file = FileFacts::new(module_path(i)).with_hash(i as u64 + 1);
            for (k, &kind) in exports[i].iter().enumerate() {
                file = file.with_export(ExportFact::new(format!("e{k}"), KINDS[kind]));
            }
            for &(_, to) in edges.iter().filter(|(from, _)| *from == i) {
                file = file.with_import(ImportFact::new(format!("./m{to:02}"), &["e0"]).resolved(module_path(to)));
            }
            file
        })
        .collect()
}

fn analyze(files: &[FileFacts]) -> CouplingAnalysis {
    let config = CouplingConfig {
        granularity: Some(Granularity::File),
        ..CouplingConfig::default()
    };
    CouplingAnalyzer::new(config).analyze(files, &unresolved)
}

fn unresolved(_: &str, _: &str) -> Option<String> {
    None
}

/// Reference SCCs of size > 1 over the same edges, self-imports dropped.
fn reference_cycles(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<String>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<_> = (0..n).map(|i| graph.add_node(i)).collect();
    for &(from, to) in edges {
        if from != to {
            graph.add_edge(nodes[from], nodes[to], ());
        }
    }
    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|c| c.len() > 1)
        .map(|c| {
            let mut members: Vec<String> = c.into_iter().map(|idx| module_path(graph[idx])).collect();
            members.sort();
            members
        })
        .collect();
    cycles.sort();
    cycles
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn metrics_stay_within_bounds((n, edges, exports) in graph_spec()) {
        let analysis = analyze(&files_for(n, &edges, &exports));
        prop_assert_eq!(analysis.result.metrics.len(), n);
        for m in &analysis.result.metrics {
            prop_assert!((0.0..=1.0).contains(&m.instability), "{}: I={}", m.module, m.instability);
            prop_assert!((0.0..=1.0).contains(&m.abstractness), "{}: A={}", m.module, m.abstractness);
            prop_assert!((m.distance - (m.abstractness + m.instability - 1.0).abs()).abs() < 1e-9);
            prop_assert_eq!(m.used_exports + m.unused_exports, m.export_count);
            prop_assert!(m.abstract_export_count <= m.export_count);
        }
        let health = &analysis.result.health;
        prop_assert!((0.0..=100.0).contains(&health.score), "score {}", health.score);
    }

    #[test]
    fn coupling_counts_sum_to_edge_count((n, edges, exports) in graph_spec()) {
        let analysis = analyze(&files_for(n, &edges, &exports));
        let distinct: FxHashSet<(usize, usize)> = edges.iter().copied().filter(|(a, b)| a != b).collect();
        let ca: u32 = analysis.result.metrics.iter().map(|m| m.ca).sum();
        let ce: u32 = analysis.result.metrics.iter().map(|m| m.ce).sum();
        prop_assert_eq!(ca as usize, distinct.len());
        prop_assert_eq!(ce as usize, distinct.len());
    }

    #[test]
    fn cycles_match_reference_scc((n, edges, exports) in graph_spec()) {
        let analysis = analyze(&files_for(n, &edges, &exports));

        let mut found: Vec<Vec<String>> = analysis
            .result
            .cycles
            .iter()
            .map(|c| {
                let mut members = c.members.clone();
                members.sort();
                members
            })
            .collect();
        found.sort();
        prop_assert_eq!(found, reference_cycles(n, &edges));

        let mut seen = FxHashSet::default();
        for cycle in &analysis.result.cycles {
            prop_assert!(!cycle.break_points.is_empty());
            for member in &cycle.members {
                prop_assert!(seen.insert(member.clone()), "{} in two cycles", member);
            }
        }
    }

    #[test]
    fn condensation_is_a_dag((n, edges, exports) in graph_spec()) {
        let analysis = analyze(&files_for(n, &edges, &exports));
        let condensed = analysis.condensation();
        prop_assert!(condensed.is_acyclic());
        let order = condensed.build_order();
        prop_assert!(order.is_some());
        let members: usize = condensed.nodes().map(|c| c.members.len()).sum();
        prop_assert_eq!(members, n);
        prop_assert_eq!(
            condensed.nodes().filter(|c| c.is_cycle).count(),
            analysis.result.cycles.len()
        );
    }

    #[test]
    fn repeated_runs_are_identical((n, edges, exports) in graph_spec()) {
        let files = files_for(n, &edges, &exports);
        let first = analyze(&files);
        let second = analyze(&files);
        prop_assert_eq!(&first.result.metrics, &second.result.metrics);
        prop_assert_eq!(&first.result.cycles, &second.result.cycles);
        prop_assert_eq!(&first.result.health, &second.result.health);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn incremental_matches_full_after_one_file_changes(
        (n, edges, exports) in graph_spec(),
        changed in 0usize..14,
        new_targets in prop::collection::vec(0usize..14, 0..4),
    ) {
        let changed = changed % n;
        let mut files = files_for(n, &edges, &exports);
        let config = CouplingConfig {
            granularity: Some(Granularity::File),
            ..CouplingConfig::default()
        };
        let mut coordinator = IncrementalCoordinator::new(CouplingAnalyzer::new(config));
        coordinator.update(&files, &unresolved);

        let mut replacement = FileFacts::new(module_path(changed)).with_hash(1_000);
        for t in new_targets.iter().map(|t| t % n) {
            replacement = replacement.with_import(ImportFact::new(format!("./m{t:02}"), &["e0"]).resolved(module_path(t)));
        }
        files[changed] = replacement;

        let (_, incremental) = coordinator.update(&files, &unresolved);
        let full = analyze(&files);
        prop_assert_eq!(&incremental.result.metrics, &full.result.metrics);
        prop_assert_eq!(&incremental.result.cycles, &full.result.cycles);
        prop_assert_eq!(&incremental.result.unused_exports, &full.result.unused_exports);
        prop_assert_eq!(&incremental.result.health, &full.result.health);
    }
}
