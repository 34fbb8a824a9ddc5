//! Cycle-breaking suggestions.
//!
//! Every distinct edge inside a cycle is a candidate cut. For a simple ring
//! these are exactly the adjacent member pairs; in a dense SCC the chords
//! between non-adjacent members are candidates too, and pairs with no edge
//! between them never are. The cheapest cut leaves a module that depends on
//! little and is depended on by many.

use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;
use strata_core::types::collections::{FxHashMap, FxHashSet};

use super::graph::ModuleGraph;
use super::types::{BreakApproach, BreakPoint, EffortLevel, ModuleMetrics, ModuleRole};

const FEW_SYMBOLS: u32 = 2;
const MODERATE_SYMBOLS: u32 = 5;
const MANY_SYMBOLS: u32 = 10;

/// Ce(from) / max(Ca(to), 1).
pub fn break_score(from_ce: u32, to_ca: u32) -> f64 {
    from_ce as f64 / to_ca.max(1) as f64
}

pub fn choose_approach(from_role: ModuleRole, to_role: ModuleRole, symbol_count: u32) -> BreakApproach {
    if to_role == ModuleRole::Authority {
        BreakApproach::ExtractInterface
    } else if from_role == ModuleRole::Hub && to_role == ModuleRole::Hub {
        BreakApproach::IntroduceMediator
    } else if symbol_count <= FEW_SYMBOLS {
        BreakApproach::DependencyInversion
    } else if symbol_count > MANY_SYMBOLS {
        BreakApproach::MergeModules
    } else {
        BreakApproach::ExtractCommon
    }
}

pub fn effort_for(symbol_count: u32) -> EffortLevel {
    if symbol_count <= FEW_SYMBOLS {
        EffortLevel::Low
    } else if symbol_count <= MODERATE_SYMBOLS {
        EffortLevel::Medium
    } else {
        EffortLevel::High
    }
}

fn rationale(approach: BreakApproach, from: &str, to: &str, symbol_count: u32) -> String {
    match approach {
        BreakApproach::ExtractInterface => {
            format!("{to} is depended on widely; have {from} depend on an interface it owns instead")
        }
        BreakApproach::IntroduceMediator => {
            format!("{from} and {to} are both hubs; route their interaction through a mediator")
        }
        BreakApproach::DependencyInversion => {
            format!("{from} uses {symbol_count} symbol(s) from {to}; invert the dependency behind an abstraction")
        }
        BreakApproach::MergeModules => {
            format!("{from} uses {symbol_count} symbols from {to}; the two may belong in one module")
        }
        BreakApproach::ExtractCommon => {
            format!("move the {symbol_count} shared symbols between {from} and {to} into a common module")
        }
    }
}

/// Rank the edges of one cycle, best cut first.
pub fn suggest_break_points(
    graph: &ModuleGraph,
    cycle_nodes: &[NodeIndex],
    metrics: &FxHashMap<&str, &ModuleMetrics>,
) -> Vec<BreakPoint> {
    let members: FxHashSet<NodeIndex> = cycle_nodes.iter().copied().collect();
    let mut candidates = Vec::new();

    for &from in cycle_nodes {
        let mut targets: Vec<NodeIndex> = graph
            .inner()
            .neighbors_directed(from, Direction::Outgoing)
            .filter(|t| members.contains(t))
            .collect();
        targets.sort_unstable();
        targets.dedup();

        for to in targets {
            let from_path = graph.path_of(from);
            let to_path = graph.path_of(to);
            let symbol_count = graph
                .edges_between(from, to)
                .flat_map(|e| e.symbols.iter().map(String::as_str))
                .collect::<FxHashSet<&str>>()
                .len() as u32;

            let from_metrics = metrics.get(from_path);
            let to_metrics = metrics.get(to_path);
            let from_ce = from_metrics.map_or(0, |m| m.ce);
            let to_ca = to_metrics.map_or(0, |m| m.ca);
            let from_role = from_metrics.map_or(ModuleRole::Balanced, |m| m.role);
            let to_role = to_metrics.map_or(ModuleRole::Balanced, |m| m.role);

            let approach = choose_approach(from_role, to_role, symbol_count);
            candidates.push(BreakPoint {
                from: from_path.to_string(),
                to: to_path.to_string(),
                score: break_score(from_ce, to_ca),
                symbol_count,
                approach,
                effort: effort_for(symbol_count),
                rationale: rationale(approach, from_path, to_path, symbol_count),
            });
        }
    }

    candidates.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.from.cmp(&b.from))
            .then_with(|| a.to.cmp(&b.to))
    });
    candidates
}
