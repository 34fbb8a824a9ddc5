//! The coupling pipeline.
//!
//! Build → counts → metrics → roles → cycles → break points → hotspots,
//! unused exports, health. Counts and cycles come from the selected backend;
//! everything else runs in memory.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use petgraph::Direction;
use strata_core::config::CouplingConfig;
use strata_core::errors::CouplingError;
use strata_core::types::collections::FxHashMap;

use super::backend::{select_backend, CouplingBackend, InMemoryBackend, SccResult};
use super::break_points::suggest_break_points;
use super::builder::{BuildOutput, BuildStats, GraphBuilder, ModuleAssigner};
use super::condensation::CondensationGraph;
use super::cycle_detection::{detect_cycles, strongly_connected_components};
use super::facts::{FileFacts, ImportResolver};
use super::graph::ModuleGraph;
use super::health::{compute_health, is_hotspot};
use super::impact::{CallGraphProvider, ImpactContext, ImpactOptions};
use super::martin_metrics::{compute_martin_metrics, CouplingCounts};
use super::roles::{assign_roles, RoleThresholds};
use super::types::{
    BackendKind, CouplingAnalysisResult, CouplingSummary, CouplingTrend, CycleStatus, Hotspot, ModuleMetrics,
    ModuleRole, RefactorImpact, RunStats, UnusedExport, Zone,
};
use super::usage::{NameMatchUsageResolver, UsageResolver};
use super::zones::compute_trend;

/// Wall-clock start plus a monotonic timer for one run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunClock {
    started_at: i64,
    start: Instant,
}

impl RunClock {
    pub(crate) fn start() -> Self {
        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self {
            started_at,
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// The backend chosen for one run, or the reason none could be opened.
pub(crate) struct BackendRun {
    backend: Result<Arc<dyn CouplingBackend>, String>,
}

impl BackendRun {
    pub(crate) fn kind(&self) -> BackendKind {
        match &self.backend {
            Ok(b) => b.kind(),
            Err(_) => BackendKind::InMemory,
        }
    }

    /// Counts from the backend, falling back to the graph on failure.
    pub(crate) fn counts(&self, graph: &ModuleGraph) -> CouplingCounts {
        let fallback = || InMemoryBackend.coupling_counts(graph).unwrap_or_default();
        match &self.backend {
            Ok(backend) => backend.coupling_counts(graph).unwrap_or_else(|e| {
                tracing::warn!(backend = backend.kind().name(), error = %e, "coupling count query failed, counting in memory");
                fallback()
            }),
            Err(_) => fallback(),
        }
    }

    /// Components from the backend. Any failure yields no cycles and a
    /// `Skipped` status instead of failing the run.
    pub(crate) fn components(&self, graph: &ModuleGraph) -> SccResult {
        let failure = match &self.backend {
            Ok(backend) => match backend.strongly_connected(graph) {
                Ok(scc) => return scc,
                Err(e) => e.to_string(),
            },
            Err(reason) => reason.clone(),
        };
        tracing::warn!(reason = %failure, "cycle detection skipped, returning metrics only");
        SccResult {
            components: Vec::new(),
            status: CycleStatus::Skipped { reason: failure },
        }
    }
}

/// Coupling analyzer. Holds configuration and pluggable collaborators;
/// every run is independent.
pub struct CouplingAnalyzer {
    config: CouplingConfig,
    usage: Box<dyn UsageResolver>,
    backend: Option<Arc<dyn CouplingBackend>>,
    package_roots: Vec<String>,
}

impl CouplingAnalyzer {
    pub fn new(config: CouplingConfig) -> Self {
        Self {
            config,
            usage: Box::new(NameMatchUsageResolver),
            backend: None,
            package_roots: Vec::new(),
        }
    }

    pub fn with_usage_resolver(mut self, usage: Box<dyn UsageResolver>) -> Self {
        self.usage = usage;
        self
    }

    /// Use this backend regardless of graph size.
    pub fn with_backend(mut self, backend: Box<dyn CouplingBackend>) -> Self {
        self.backend = Some(Arc::from(backend));
        self
    }

    /// Extra package roots for package granularity, beyond detected manifests.
    pub fn with_package_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.package_roots.extend(roots.into_iter().map(Into::into));
        self
    }

    pub fn config(&self) -> &CouplingConfig {
        &self.config
    }

    pub(crate) fn usage(&self) -> &dyn UsageResolver {
        self.usage.as_ref()
    }

    pub(crate) fn assigner(&self, files: &[FileFacts]) -> ModuleAssigner {
        ModuleAssigner::new(
            self.config.effective_granularity(),
            &self.config.effective_package_manifests(),
        )
        .with_package_roots(self.package_roots.iter().map(String::as_str), files)
    }

    pub(crate) fn backend_run(&self, module_count: usize) -> BackendRun {
        let backend = match &self.backend {
            Some(backend) => Ok(Arc::clone(backend)),
            None => select_backend(module_count, &self.config)
                .map(Arc::from)
                .map_err(|e| e.to_string()),
        };
        BackendRun { backend }
    }

    /// Full analysis of `files`.
    ///
    /// Never fails: resolution misses drop edges, and backend failures
    /// degrade to in-memory counts or skipped cycle detection.
    pub fn analyze(&self, files: &[FileFacts], resolver: &dyn ImportResolver) -> CouplingAnalysis {
        let clock = RunClock::start();
        let build = GraphBuilder::new(self.assigner(files), resolver).build(files);
        self.analyze_build(build, clock)
    }

    /// Analyze an already-built graph.
    pub fn analyze_graph(&self, build: BuildOutput) -> CouplingAnalysis {
        self.analyze_build(build, RunClock::start())
    }

    fn analyze_build(&self, build: BuildOutput, clock: RunClock) -> CouplingAnalysis {
        let run = self.backend_run(build.graph.module_count());
        let counts = run.counts(&build.graph);
        let mut metrics = compute_martin_metrics(
            &build.graph,
            &counts,
            self.usage(),
            &self.config.effective_zone_thresholds(),
        );
        let role_thresholds = assign_roles(&mut metrics);
        let scc = run.components(&build.graph);
        self.finalize(build, metrics, role_thresholds, scc, run.kind(), clock)
    }

    /// Everything after metrics and roles: cycles, break points, hotspots,
    /// unused exports, health and summary.
    pub(crate) fn finalize(
        &self,
        build: BuildOutput,
        metrics: Vec<ModuleMetrics>,
        role_thresholds: RoleThresholds,
        scc: SccResult,
        backend: BackendKind,
        clock: RunClock,
    ) -> CouplingAnalysis {
        let graph = &build.graph;
        let by_path: FxHashMap<&str, &ModuleMetrics> = metrics.iter().map(|m| (m.module.as_str(), m)).collect();

        let cycles: Vec<_> = detect_cycles(graph, scc.components, &self.config.effective_cycle_thresholds())
            .into_iter()
            .map(|mut detected| {
                detected.cycle.break_points = suggest_break_points(graph, &detected.nodes, &by_path);
                detected.cycle
            })
            .collect();

        let hotspots = self.hotspots(graph, &metrics);
        let unused_exports = self.unused_exports(graph, &metrics);
        let health = compute_health(
            &metrics,
            &cycles,
            self.config.effective_hotspot_threshold(),
            &self.config.effective_health_weights(),
        );
        let summary = summarize(&metrics);

        let stats = RunStats {
            started_at: clock.started_at,
            duration_ms: clock.elapsed_ms(),
            granularity: self.config.effective_granularity(),
            files_analyzed: build.stats.files as u32,
            module_count: graph.module_count() as u32,
            edge_count: graph.edge_count() as u32,
            backend,
            cycle_status: scc.status,
        };

        tracing::info!(
            modules = stats.module_count,
            edges = stats.edge_count,
            cycles = cycles.len(),
            hotspots = hotspots.len(),
            unused_exports = unused_exports.len(),
            health = health.score,
            backend = backend.name(),
            cycle_status = stats.cycle_status.name(),
            duration_ms = stats.duration_ms,
            "coupling analysis complete"
        );

        CouplingAnalysis {
            result: CouplingAnalysisResult {
                metrics,
                cycles,
                hotspots,
                unused_exports,
                health,
                summary,
                stats,
            },
            role_thresholds,
            build,
        }
    }

    fn hotspots(&self, graph: &ModuleGraph, metrics: &[ModuleMetrics]) -> Vec<Hotspot> {
        let threshold = self.config.effective_hotspot_threshold();
        let mut hotspots: Vec<Hotspot> = metrics
            .iter()
            .filter(|m| is_hotspot(m, threshold))
            .filter_map(|m| {
                let idx = graph.index_of(&m.module)?;
                Some(Hotspot {
                    module: m.module.clone(),
                    total_coupling: m.total_coupling(),
                    incoming: graph.neighbor_paths(idx, Direction::Incoming),
                    outgoing: graph.neighbor_paths(idx, Direction::Outgoing),
                })
            })
            .collect();
        hotspots.sort_by(|a, b| {
            b.total_coupling
                .cmp(&a.total_coupling)
                .then_with(|| a.module.cmp(&b.module))
        });
        hotspots
    }

    fn unused_exports(&self, graph: &ModuleGraph, metrics: &[ModuleMetrics]) -> Vec<UnusedExport> {
        let mut unused = Vec::new();
        for m in metrics.iter().filter(|m| m.unused_exports > 0) {
            let Some(idx) = graph.index_of(&m.module) else {
                continue;
            };
            let Some(node) = graph.node(idx) else {
                continue;
            };
            let used = self.usage.used_exports(graph, idx);
            for (i, export) in node.exports.iter().enumerate() {
                if !used.contains(&i) {
                    unused.push(UnusedExport {
                        module: m.module.clone(),
                        name: export.name.clone(),
                        kind: export.kind.name().to_string(),
                        file: export.file.clone(),
                        line: export.line,
                    });
                }
            }
        }
        unused
    }
}

impl Default for CouplingAnalyzer {
    fn default() -> Self {
        Self::new(CouplingConfig::default())
    }
}

fn summarize(metrics: &[ModuleMetrics]) -> CouplingSummary {
    CouplingSummary {
        zone_counts: Zone::ALL
            .iter()
            .map(|z| (*z, metrics.iter().filter(|m| m.zone == *z).count() as u32))
            .collect(),
        role_counts: ModuleRole::ALL
            .iter()
            .map(|r| (*r, metrics.iter().filter(|m| m.role == *r).count() as u32))
            .collect(),
    }
}

/// One completed run: the graph it ran on and everything computed from it.
#[derive(Debug, Clone)]
pub struct CouplingAnalysis {
    pub result: CouplingAnalysisResult,
    pub role_thresholds: RoleThresholds,
    pub(crate) build: BuildOutput,
}

impl CouplingAnalysis {
    pub fn graph(&self) -> &ModuleGraph {
        &self.build.graph
    }

    pub fn file_to_module(&self) -> &FxHashMap<String, String> {
        &self.build.file_to_module
    }

    pub fn build_stats(&self) -> &BuildStats {
        &self.build.stats
    }

    pub fn module(&self, path: &str) -> Option<&ModuleMetrics> {
        let metrics = &self.result.metrics;
        metrics
            .binary_search_by(|m| m.module.as_str().cmp(path))
            .ok()
            .map(|i| &metrics[i])
    }

    /// Refactor impact for one module. Unknown paths are `ModuleNotFound`.
    pub fn impact(
        &self,
        module: &str,
        call_graph: Option<&dyn CallGraphProvider>,
        options: &ImpactOptions,
    ) -> Result<RefactorImpact, CouplingError> {
        ImpactContext {
            graph: &self.build.graph,
            file_to_module: &self.build.file_to_module,
            metrics: &self.result.metrics,
            cycles: &self.result.cycles,
        }
        .analyze(module, call_graph, options)
    }

    /// Exact condensation of the current graph, built on demand.
    pub fn condensation(&self) -> CondensationGraph {
        let graph = &self.build.graph;
        CondensationGraph::build(graph, &strongly_connected_components(graph))
    }

    /// Distance trends for modules present in both `previous` and this run.
    pub fn trends(&self, previous: &[ModuleMetrics]) -> Vec<CouplingTrend> {
        previous
            .iter()
            .filter_map(|prev| self.module(&prev.module).map(|cur| compute_trend(prev, cur)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::facts::{ExportFact, ExportKind, ImportFact};
    use strata_core::config::Granularity;

    fn file_config() -> CouplingConfig {
        CouplingConfig {
            granularity: Some(Granularity::File),
            ..CouplingConfig::default()
        }
    }

    fn no_resolver(_: &str, _: &str) -> Option<String> {
        None
    }

    #[test]
    fn summary_counts_every_zone_and_role() {
        let files = vec![
            FileFacts::new("a.ts").with_import(ImportFact::new("./b", &["x"]).resolved("b.ts")),
            FileFacts::new("b.ts").with_export(ExportFact::new("x", ExportKind::Function)),
            FileFacts::new("c.ts"),
        ];
        let analysis = CouplingAnalyzer::new(file_config())
            .analyze(&files, &no_resolver);
        let summary = &analysis.result.summary;
        assert_eq!(summary.zone_counts.len(), 4);
        assert_eq!(summary.role_counts.len(), 4);
        assert_eq!(summary.role_count(ModuleRole::Isolated), 1);
        let total: u32 = summary.zone_counts.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn hotspots_carry_neighbors() {
        let files = vec![
            FileFacts::new("hub.ts")
                .with_import(ImportFact::new("./x", &[]).resolved("x.ts"))
                .with_import(ImportFact::new("./y", &[]).resolved("y.ts")),
            FileFacts::new("x.ts"),
            FileFacts::new("y.ts"),
            FileFacts::new("z.ts").with_import(ImportFact::new("./hub", &[]).resolved("hub.ts")),
        ];
        let analysis = CouplingAnalyzer::new(file_config())
            .analyze(&files, &no_resolver);
        let hotspots = &analysis.result.hotspots;
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].module, "hub.ts");
        assert_eq!(hotspots[0].total_coupling, 3);
        assert_eq!(hotspots[0].incoming, vec!["z.ts"]);
        assert_eq!(hotspots[0].outgoing, vec!["x.ts", "y.ts"]);
    }

    #[test]
    fn trends_compare_by_module() {
        let files = vec![FileFacts::new("a.ts")];
        let analysis = CouplingAnalyzer::new(file_config())
            .analyze(&files, &no_resolver);
        let mut previous = analysis.result.metrics.clone();
        previous[0].distance = 0.5;
        let trends = analysis.trends(&previous);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].direction, crate::coupling::types::TrendDirection::Degrading);
    }
}
