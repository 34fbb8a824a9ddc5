//! Refactor impact: who is affected if a module changes, and how risky it is.
//!
//! Transitive dependents come from the call graph when one is available and
//! knows the module's functions. Otherwise a reverse BFS over the module
//! graph is used.

use std::collections::VecDeque;

use petgraph::Direction;
use strata_core::config::CouplingConfig;
use strata_core::errors::CouplingError;
use strata_core::types::collections::{FxHashMap, FxHashSet};

use super::graph::ModuleGraph;
use super::types::{
    DependencyCycle, EffortLevel, ModuleHealth, ModuleMetrics, ModuleRole, RefactorImpact, RiskLevel, Zone,
};

/// A caller reported by the call graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerRef {
    pub function_id: String,
    pub file: String,
}

/// Function-level call graph, supplied by an upstream collaborator.
pub trait CallGraphProvider {
    /// Function ids defined in `file`.
    fn functions_in_file(&self, file: &str) -> Vec<String>;
    /// Every function that reaches `function_id` within `max_depth` calls.
    fn transitive_callers(&self, function_id: &str, max_depth: u32) -> Vec<CallerRef>;
}

/// Settings for impact analysis.
#[derive(Debug, Clone)]
pub struct ImpactOptions {
    pub max_depth: u32,
    pub test_patterns: Vec<glob::Pattern>,
}

impl ImpactOptions {
    /// Invalid test globs are skipped with a warning.
    pub fn from_config(config: &CouplingConfig) -> Self {
        let test_patterns = config
            .effective_test_patterns()
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "ignoring invalid test pattern");
                    None
                }
            })
            .collect();
        Self {
            max_depth: config.effective_impact_max_depth(),
            test_patterns,
        }
    }

    pub fn is_test_file(&self, file: &str) -> bool {
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..glob::MatchOptions::new()
        };
        self.test_patterns.iter().any(|p| p.matches_with(file, options))
    }
}

impl Default for ImpactOptions {
    fn default() -> Self {
        Self::from_config(&CouplingConfig::default())
    }
}

/// Read-only view of one analysis run needed to answer impact queries.
pub struct ImpactContext<'a> {
    pub graph: &'a ModuleGraph,
    pub file_to_module: &'a FxHashMap<String, String>,
    /// Sorted by module path.
    pub metrics: &'a [ModuleMetrics],
    pub cycles: &'a [DependencyCycle],
}

impl ImpactContext<'_> {
    pub fn analyze(
        &self,
        module: &str,
        call_graph: Option<&dyn CallGraphProvider>,
        options: &ImpactOptions,
    ) -> Result<RefactorImpact, CouplingError> {
        let idx = self.graph.index_of(module).ok_or_else(|| CouplingError::ModuleNotFound {
            path: module.to_string(),
        })?;
        let metrics = self
            .metrics
            .binary_search_by(|m| m.module.as_str().cmp(module))
            .ok()
            .map(|i| &self.metrics[i])
            .ok_or_else(|| CouplingError::ModuleNotFound {
                path: module.to_string(),
            })?;

        let direct_dependents = self.graph.neighbor_paths(idx, Direction::Incoming);

        let via_call_graph = call_graph.and_then(|cg| self.call_graph_dependents(module, cg, options.max_depth));
        let used_call_graph = via_call_graph.is_some();
        let transitive: FxHashSet<String> = match via_call_graph {
            Some(mut set) => {
                set.extend(direct_dependents.iter().cloned());
                set
            }
            None => self.reverse_reachable(idx),
        };
        let mut transitive_dependents: Vec<String> = transitive.into_iter().collect();
        transitive_dependents.sort();

        let affected_tests = self.affected_tests(module, &transitive_dependents, options);
        let affected = transitive_dependents.len();
        let health = module_health(metrics);
        let in_cycle = self.cycles.iter().any(|c| c.contains(module));

        Ok(RefactorImpact {
            module: module.to_string(),
            suggestions: suggestions(metrics, affected, in_cycle),
            direct_dependents,
            transitive_dependents,
            affected_tests,
            used_call_graph,
            health,
            effort: effort_for(affected),
            risk: risk_for(affected, metrics.zone),
        })
    }

    /// `None` when the call graph knows no functions in the module.
    fn call_graph_dependents(
        &self,
        module: &str,
        call_graph: &dyn CallGraphProvider,
        max_depth: u32,
    ) -> Option<FxHashSet<String>> {
        let node = self.graph.module(module)?;
        let functions: Vec<String> = node
            .files
            .iter()
            .flat_map(|f| call_graph.functions_in_file(f))
            .collect();
        if functions.is_empty() {
            return None;
        }

        let mut dependents = FxHashSet::default();
        for function in &functions {
            for caller in call_graph.transitive_callers(function, max_depth) {
                match self.file_to_module.get(&caller.file) {
                    Some(owner) if owner != module => {
                        dependents.insert(owner.clone());
                    }
                    _ => {}
                }
            }
        }
        Some(dependents)
    }

    /// Reverse BFS from `start`, excluding it.
    fn reverse_reachable(&self, start: petgraph::stable_graph::NodeIndex) -> FxHashSet<String> {
        let mut seen = FxHashSet::default();
        seen.insert(start);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for dependent in self.graph.distinct_neighbors(current, Direction::Incoming) {
                if seen.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
        seen.remove(&start);
        seen.into_iter().map(|n| self.graph.path_of(n).to_string()).collect()
    }

    fn affected_tests(&self, module: &str, dependents: &[String], options: &ImpactOptions) -> Vec<String> {
        let mut tests: Vec<String> = std::iter::once(module)
            .chain(dependents.iter().map(String::as_str))
            .filter_map(|m| self.graph.module(m))
            .flat_map(|node| node.files.iter())
            .filter(|f| options.is_test_file(f))
            .cloned()
            .collect();
        tests.sort();
        tests.dedup();
        tests
    }
}

pub fn effort_for(affected: usize) -> EffortLevel {
    match affected {
        0..=3 => EffortLevel::Low,
        4..=10 => EffortLevel::Medium,
        11..=25 => EffortLevel::High,
        _ => EffortLevel::VeryHigh,
    }
}

/// Zone-of-Pain modules move up a tier one step earlier.
pub fn risk_for(affected: usize, zone: Zone) -> RiskLevel {
    if zone == Zone::ZoneOfPain {
        match affected {
            0 => RiskLevel::Low,
            1..=3 => RiskLevel::Medium,
            4..=10 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    } else {
        match affected {
            0..=3 => RiskLevel::Low,
            4..=10 => RiskLevel::Medium,
            11..=25 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

pub fn module_health(metrics: &ModuleMetrics) -> ModuleHealth {
    let mut score: f64 = 100.0;
    let mut issues = Vec::new();

    if metrics.total_coupling() > 10 {
        score -= 20.0;
        issues.push(format!("high coupling: Ca + Ce = {}", metrics.total_coupling()));
    }
    match metrics.zone {
        Zone::ZoneOfPain => {
            score -= 20.0;
            issues.push("in the zone of pain: stable and concrete".to_string());
        }
        Zone::ZoneOfUselessness => {
            score -= 15.0;
            issues.push("in the zone of uselessness: unstable and abstract".to_string());
        }
        _ => {}
    }
    if metrics.unused_exports > 5 {
        score -= 10.0;
        issues.push(format!("{} unused exports", metrics.unused_exports));
    }
    if metrics.distance > 0.5 {
        score -= 15.0;
        issues.push(format!("far from the main sequence: D = {:.2}", metrics.distance));
    }

    ModuleHealth {
        score: score.clamp(0.0, 100.0),
        issues,
    }
}

fn suggestions(metrics: &ModuleMetrics, affected: usize, in_cycle: bool) -> Vec<String> {
    let mut out = Vec::new();
    if in_cycle {
        out.push(format!("break the dependency cycle through {} before refactoring", metrics.module));
    }
    match metrics.zone {
        Zone::ZoneOfPain if metrics.ca > 0 => out.push(format!(
            "introduce an abstraction in front of {}; {} module(s) depend on it directly",
            metrics.module, metrics.ca
        )),
        Zone::ZoneOfUselessness => out.push("remove or inline abstractions nobody depends on".to_string()),
        _ => {}
    }
    if metrics.role == ModuleRole::Hub {
        out.push("split this hub so dependents and dependencies stop converging here".to_string());
    }
    if metrics.unused_exports > 0 {
        out.push(format!("drop {} unused export(s) first to shrink the surface", metrics.unused_exports));
    }
    if affected > 10 {
        out.push("change behind a stable interface and migrate dependents incrementally".to_string());
    }
    out
}
