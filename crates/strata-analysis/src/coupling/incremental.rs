//! Incremental coupling analysis driven by content hashes.
//!
//! Changed modules are rewired in place; metrics are recomputed for the
//! changed modules, their direct dependents and every module whose incoming
//! edges moved. Cycle detection always runs over the whole graph.

use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;
use strata_core::types::collections::{FxHashMap, FxHashSet};

use super::analyzer::{CouplingAnalysis, CouplingAnalyzer, RunClock};
use super::builder::{module_node, GraphBuilder};
use super::facts::{FileFacts, ImportResolver};
use super::martin_metrics::module_metrics;
use super::roles::RoleThresholds;

/// Above this share of changed modules a full rebuild is cheaper.
const FULL_REBUILD_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalMode {
    Full,
    Incremental,
    /// No content changed; the previous result was reused.
    Unchanged,
}

impl IncrementalMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalOutcome {
    pub mode: IncrementalMode,
    /// Modules owning a changed file, sorted.
    pub changed_modules: Vec<String>,
    /// Modules whose metrics were recomputed, sorted.
    pub affected_modules: Vec<String>,
}

/// Keeps the last analysis and the file hashes it was built from.
pub struct IncrementalCoordinator {
    analyzer: CouplingAnalyzer,
    state: Option<CouplingAnalysis>,
    file_hashes: FxHashMap<String, u64>,
}

impl IncrementalCoordinator {
    pub fn new(analyzer: CouplingAnalyzer) -> Self {
        Self {
            analyzer,
            state: None,
            file_hashes: FxHashMap::default(),
        }
    }

    pub fn analyzer(&self) -> &CouplingAnalyzer {
        &self.analyzer
    }

    pub fn analysis(&self) -> Option<&CouplingAnalysis> {
        self.state.as_ref()
    }

    /// Bring the analysis up to date with `files`.
    pub fn update(
        &mut self,
        files: &[FileFacts],
        resolver: &dyn ImportResolver,
    ) -> (IncrementalOutcome, &CouplingAnalysis) {
        let new_hashes: FxHashMap<String, u64> =
            files.iter().map(|f| (f.file_path.clone(), f.content_hash)).collect();

        let outcome = match self.state.take() {
            Some(previous) if self.analyzer.config().effective_incremental() && self.same_file_set(&new_hashes) => {
                self.update_in_place(previous, files, resolver, &new_hashes)
            }
            _ => self.full(files, resolver),
        };
        self.file_hashes = new_hashes;

        tracing::info!(
            mode = outcome.mode.name(),
            changed = outcome.changed_modules.len(),
            affected = outcome.affected_modules.len(),
            "incremental coupling update"
        );
        let analysis = self.state.get_or_insert_with(|| self.analyzer.analyze(files, resolver));
        (outcome, analysis)
    }

    fn same_file_set(&self, new_hashes: &FxHashMap<String, u64>) -> bool {
        new_hashes.len() == self.file_hashes.len() && new_hashes.keys().all(|k| self.file_hashes.contains_key(k))
    }

    fn full(&mut self, files: &[FileFacts], resolver: &dyn ImportResolver) -> IncrementalOutcome {
        let analysis = self.analyzer.analyze(files, resolver);
        let all: Vec<String> = analysis.result.metrics.iter().map(|m| m.module.clone()).collect();
        self.state = Some(analysis);
        IncrementalOutcome {
            mode: IncrementalMode::Full,
            changed_modules: all.clone(),
            affected_modules: all,
        }
    }

    fn update_in_place(
        &mut self,
        previous: CouplingAnalysis,
        files: &[FileFacts],
        resolver: &dyn ImportResolver,
        new_hashes: &FxHashMap<String, u64>,
    ) -> IncrementalOutcome {
        let changed_modules: FxHashSet<String> = new_hashes
            .iter()
            .filter(|(path, hash)| self.file_hashes.get(*path) != Some(*hash))
            .filter_map(|(path, _)| previous.file_to_module().get(path).cloned())
            .collect();

        if changed_modules.is_empty() {
            self.state = Some(previous);
            return IncrementalOutcome {
                mode: IncrementalMode::Unchanged,
                changed_modules: Vec::new(),
                affected_modules: Vec::new(),
            };
        }

        let module_count = previous.graph().module_count().max(1);
        if changed_modules.len() as f64 / module_count as f64 > FULL_REBUILD_RATIO {
            tracing::debug!(changed = changed_modules.len(), module_count, "change set too large, rebuilding");
            return self.full(files, resolver);
        }

        let clock = RunClock::start();
        let CouplingAnalysis {
            result,
            role_thresholds,
            mut build,
        } = previous;
        let mut metrics = result.metrics;

        let mut files_by_module: FxHashMap<String, Vec<&FileFacts>> = FxHashMap::default();
        for file in files {
            if let Some(module) = build.file_to_module.get(&file.file_path) {
                if changed_modules.contains(module) {
                    files_by_module.entry(module.clone()).or_default().push(file);
                }
            }
        }

        let mut sorted_changed: Vec<String> = changed_modules.into_iter().collect();
        sorted_changed.sort();

        // Rewire: refresh node data and outgoing edges of every changed module.
        let mut affected: FxHashSet<NodeIndex> = FxHashSet::default();
        let builder = GraphBuilder::new(self.analyzer.assigner(files), resolver);
        for module in &sorted_changed {
            let Some(idx) = build.graph.index_of(module) else {
                continue;
            };
            let members = files_by_module.get(module).cloned().unwrap_or_default();
            build.graph.add_module(module_node(module, &members));
            affected.insert(idx);
            affected.extend(build.graph.clear_outgoing(idx));

            let mut sources = members;
            sources.sort_by(|a, b| a.file_path.cmp(&b.file_path));
            for file in sources {
                builder.add_file_edges(&mut build, file);
            }
            affected.extend(build.graph.distinct_neighbors(idx, Direction::Outgoing));
            affected.extend(build.graph.distinct_neighbors(idx, Direction::Incoming));
        }
        build.stats.edges = build.graph.edge_count();

        let zones = self.analyzer.config().effective_zone_thresholds();
        let mut affected_modules: Vec<String> = Vec::with_capacity(affected.len());
        for idx in affected {
            let fresh = module_metrics(
                &build.graph,
                idx,
                build.graph.coupling_counts(idx),
                self.analyzer.usage(),
                &zones,
            );
            affected_modules.push(fresh.module.clone());
            match metrics.binary_search_by(|m| m.module.cmp(&fresh.module)) {
                Ok(i) => metrics[i] = fresh,
                Err(i) => metrics.insert(i, fresh),
            }
        }
        affected_modules.sort();

        let thresholds = RoleThresholds::collect(metrics.iter());
        if thresholds == role_thresholds {
            for m in metrics.iter_mut() {
                if affected_modules.binary_search(&m.module).is_ok() {
                    m.role = thresholds.classify(m.ca, m.ce);
                }
            }
        } else {
            for m in metrics.iter_mut() {
                m.role = thresholds.classify(m.ca, m.ce);
            }
        }

        let run = self.analyzer.backend_run(build.graph.module_count());
        let scc = run.components(&build.graph);
        self.state = Some(self.analyzer.finalize(build, metrics, thresholds, scc, run.kind(), clock));

        IncrementalOutcome {
            mode: IncrementalMode::Incremental,
            changed_modules: sorted_changed,
            affected_modules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::facts::ImportFact;
    use strata_core::config::{CouplingConfig, Granularity};

    fn coordinator(incremental: bool) -> IncrementalCoordinator {
        IncrementalCoordinator::new(CouplingAnalyzer::new(CouplingConfig {
            granularity: Some(Granularity::File),
            incremental: Some(incremental),
            ..CouplingConfig::default()
        }))
    }

    fn none(_: &str, _: &str) -> Option<String> {
        None
    }

    fn files(hash_b: u64) -> Vec<FileFacts> {
        vec![
            FileFacts::new("a.ts").with_import(ImportFact::new("./b", &["x"]).resolved("b.ts")),
            FileFacts::new("b.ts").with_hash(hash_b),
            FileFacts::new("c.ts"),
            FileFacts::new("d.ts"),
        ]
    }

    #[test]
    fn first_run_is_full_then_unchanged() {
        let mut c = coordinator(true);
        assert_eq!(c.update(&files(1), &none).0.mode, IncrementalMode::Full);
        assert_eq!(c.update(&files(1), &none).0.mode, IncrementalMode::Unchanged);
    }

    #[test]
    fn hash_change_recomputes_owner_and_dependents() {
        let mut c = coordinator(true);
        c.update(&files(1), &none);
        let (outcome, _) = c.update(&files(2), &none);
        assert_eq!(outcome.mode, IncrementalMode::Incremental);
        assert_eq!(outcome.changed_modules, vec!["b.ts"]);
        assert_eq!(outcome.affected_modules, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn disabled_incremental_always_rebuilds() {
        let mut c = coordinator(false);
        c.update(&files(1), &none);
        assert_eq!(c.update(&files(2), &none).0.mode, IncrementalMode::Full);
    }
}
