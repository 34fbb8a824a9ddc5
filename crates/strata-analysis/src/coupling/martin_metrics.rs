//! Robert C. Martin coupling metrics computation.
//!
//! Ce (efferent), Ca (afferent), I (instability), A (abstractness),
//! D (distance from main sequence).

use petgraph::stable_graph::NodeIndex;
use rayon::prelude::*;
use strata_core::config::ZoneThresholds;
use strata_core::types::collections::FxHashMap;

use super::graph::ModuleGraph;
use super::types::{ModuleMetrics, ModuleRole};
use super::usage::UsageResolver;
use super::zones::classify_zone;

/// (Ca, Ce) per node, as produced by a backend.
pub type CouplingCounts = FxHashMap<NodeIndex, (u32, u32)>;

/// I = Ce / (Ca + Ce), 0 if both are 0.
pub fn instability(ca: u32, ce: u32) -> f64 {
    if ca + ce == 0 {
        0.0
    } else {
        ce as f64 / (ca + ce) as f64
    }
}

/// A = abstract / total, 0 if nothing is exported.
pub fn abstractness(abstract_count: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        abstract_count as f64 / total as f64
    }
}

/// D = |A + I - 1|, clamped against float drift.
pub fn distance(abstractness: f64, instability: f64) -> f64 {
    (abstractness + instability - 1.0).abs().clamp(0.0, 1.0)
}

/// Metrics for one module. The role is left `Balanced` until
/// [`super::roles::assign_roles`] runs.
pub fn module_metrics(
    graph: &ModuleGraph,
    idx: NodeIndex,
    (ca, ce): (u32, u32),
    usage: &dyn UsageResolver,
    zones: &ZoneThresholds,
) -> ModuleMetrics {
    let (module, language, file_count, export_count, abstract_count) = match graph.node(idx) {
        Some(node) => (
            node.path.clone(),
            node.language.clone(),
            node.files.len() as u32,
            node.exports.len() as u32,
            node.abstract_export_count() as u32,
        ),
        None => (String::new(), None, 0, 0, 0),
    };

    let i = instability(ca, ce);
    let a = abstractness(abstract_count, export_count);
    let d = distance(a, i);
    let used = usage.used_exports(graph, idx).len() as u32;

    ModuleMetrics {
        module,
        language,
        file_count,
        ca,
        ce,
        instability: i,
        abstractness: a,
        distance: d,
        export_count,
        abstract_export_count: abstract_count,
        used_exports: used,
        unused_exports: export_count.saturating_sub(used),
        zone: classify_zone(i, a, d, zones),
        role: ModuleRole::Balanced,
    }
}

/// Compute metrics for every module in parallel. Output is sorted by path.
pub fn compute_martin_metrics(
    graph: &ModuleGraph,
    counts: &CouplingCounts,
    usage: &dyn UsageResolver,
    zones: &ZoneThresholds,
) -> Vec<ModuleMetrics> {
    graph
        .sorted_indices()
        .par_iter()
        .map(|&idx| {
            let pair = counts
                .get(&idx)
                .copied()
                .unwrap_or_else(|| graph.coupling_counts(idx));
            module_metrics(graph, idx, pair, usage, zones)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_module_sits_at_origin() {
        assert_eq!(instability(0, 0), 0.0);
        assert_eq!(abstractness(0, 0), 0.0);
        assert_eq!(distance(0.0, 0.0), 1.0);
    }

    #[test]
    fn pure_dependent_is_maximally_unstable() {
        assert_eq!(instability(0, 4), 1.0);
        assert_eq!(instability(3, 1), 0.25);
    }

    #[test]
    fn distance_on_main_sequence_is_zero() {
        assert_eq!(distance(0.5, 0.5), 0.0);
        assert_eq!(distance(1.0, 0.0), 0.0);
    }
}
