//! Dependency cycle detection via Tarjan's SCC.
//!
//! Every SCC with two or more members is a cycle, as is a single module with
//! a self-loop. Cycles are identified by a hash of their sorted member paths,
//! so the id does not depend on discovery order or node indices.

use petgraph::algo::tarjan_scc;
use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;
use strata_core::config::CycleThresholds;
use strata_core::types::collections::FxHashSet;
use xxhash_rust::xxh3::xxh3_64;

use super::graph::ModuleGraph;
use super::types::{CycleSeverity, DependencyCycle};

/// A cycle together with the node indices it was built from.
#[derive(Debug, Clone)]
pub struct DetectedCycle {
    pub cycle: DependencyCycle,
    pub nodes: Vec<NodeIndex>,
}

/// All strongly connected components, singletons included. O(V + E).
pub fn strongly_connected_components(graph: &ModuleGraph) -> Vec<Vec<NodeIndex>> {
    tarjan_scc(graph.inner())
}

/// Keep the components that are cycles.
pub fn cyclic_components(graph: &ModuleGraph, components: Vec<Vec<NodeIndex>>) -> Vec<Vec<NodeIndex>> {
    components
        .into_iter()
        .filter(|c| c.len() > 1 || (c.len() == 1 && graph.has_self_loop(c[0])))
        .collect()
}

pub fn severity_for(size: usize, thresholds: &CycleThresholds) -> CycleSeverity {
    if size > thresholds.critical_above {
        CycleSeverity::Critical
    } else if size > thresholds.high_above {
        CycleSeverity::High
    } else if size > thresholds.medium_above {
        CycleSeverity::Medium
    } else {
        CycleSeverity::Low
    }
}

/// Content-stable id: xxh3 of the sorted member paths.
pub fn cycle_id<S: AsRef<str>>(members: &[S]) -> String {
    let mut sorted: Vec<&str> = members.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    format!("{:016x}", xxh3_64(sorted.join("\n").as_bytes()))
}

/// Turn cyclic components into cycles, sorted by severity then size
/// (both descending), then id. Break points are filled in later.
pub fn detect_cycles(
    graph: &ModuleGraph,
    components: Vec<Vec<NodeIndex>>,
    thresholds: &CycleThresholds,
) -> Vec<DetectedCycle> {
    let mut cycles: Vec<DetectedCycle> = cyclic_components(graph, components)
        .into_iter()
        .map(|nodes| {
            let ordered = walk_order(graph, &nodes);
            let members: Vec<String> = ordered.iter().map(|&n| graph.path_of(n).to_string()).collect();
            let files_affected = ordered
                .iter()
                .filter_map(|&n| graph.node(n))
                .map(|node| node.files.len() as u32)
                .sum();
            DetectedCycle {
                cycle: DependencyCycle {
                    id: cycle_id(&members),
                    severity: severity_for(members.len(), thresholds),
                    members,
                    files_affected,
                    break_points: Vec::new(),
                },
                nodes: ordered,
            }
        })
        .collect();

    cycles.sort_by(|a, b| {
        b.cycle
            .severity
            .cmp(&a.cycle.severity)
            .then_with(|| b.cycle.size().cmp(&a.cycle.size()))
            .then_with(|| a.cycle.id.cmp(&b.cycle.id))
    });
    cycles
}

/// Order members by following intra-component edges from the smallest path,
/// always taking the smallest unvisited successor.
fn walk_order(graph: &ModuleGraph, nodes: &[NodeIndex]) -> Vec<NodeIndex> {
    let members: FxHashSet<NodeIndex> = nodes.iter().copied().collect();
    let mut remaining: Vec<NodeIndex> = nodes.to_vec();
    remaining.sort_by(|a, b| graph.path_of(*a).cmp(graph.path_of(*b)));

    let Some(&start) = remaining.first() else {
        return Vec::new();
    };
    let mut order = vec![start];
    let mut visited: FxHashSet<NodeIndex> = FxHashSet::default();
    visited.insert(start);

    let mut current = start;
    while let Some(next) = graph
        .distinct_neighbors(current, Direction::Outgoing)
        .into_iter()
        .filter(|n| members.contains(n) && !visited.contains(n))
        .min_by(|a, b| graph.path_of(*a).cmp(graph.path_of(*b)))
    {
        order.push(next);
        visited.insert(next);
        current = next;
    }

    order.extend(remaining.into_iter().filter(|n| !visited.contains(n)));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::graph::{DependencyEdge, ModuleNode};
    use strata_core::types::collections::SymbolList;

    fn edge() -> DependencyEdge {
        DependencyEdge {
            symbols: SymbolList::new(),
            is_type_only: false,
            file: String::new(),
            line: 1,
        }
    }

    fn graph(edges: &[(&str, &str)]) -> ModuleGraph {
        let mut g = ModuleGraph::new();
        for (a, b) in edges {
            let a = g.add_module(ModuleNode::new(*a));
            let b = g.add_module(ModuleNode::new(*b));
            g.add_edge(a, b, edge());
        }
        g
    }

    fn cycles_of(g: &ModuleGraph) -> Vec<DetectedCycle> {
        detect_cycles(g, strongly_connected_components(g), &CycleThresholds::default())
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let g = graph(&[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(cycles_of(&g).is_empty());
    }

    #[test]
    fn three_cycle_is_medium_and_walk_ordered() {
        let g = graph(&[("b", "c"), ("c", "a"), ("a", "b")]);
        let cycles = cycles_of(&g);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].cycle.members, vec!["a", "b", "c"]);
        assert_eq!(cycles[0].cycle.severity, CycleSeverity::Medium);
    }

    #[test]
    fn self_loop_is_a_low_cycle() {
        let g = graph(&[("a", "a"), ("a", "b")]);
        let cycles = cycles_of(&g);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].cycle.members, vec!["a"]);
        assert_eq!(cycles[0].cycle.severity, CycleSeverity::Low);
    }

    #[test]
    fn id_ignores_member_order() {
        assert_eq!(cycle_id(&["x", "y", "z"]), cycle_id(&["z", "x", "y"]));
        assert_ne!(cycle_id(&["x", "y"]), cycle_id(&["x", "z"]));
    }

    #[test]
    fn severity_tiers_follow_thresholds() {
        let t = CycleThresholds::default();
        assert_eq!(severity_for(2, &t), CycleSeverity::Low);
        assert_eq!(severity_for(3, &t), CycleSeverity::Medium);
        assert_eq!(severity_for(4, &t), CycleSeverity::High);
        assert_eq!(severity_for(6, &t), CycleSeverity::Critical);
    }

    #[test]
    fn larger_and_more_severe_cycles_sort_first() {
        let g = graph(&[
            ("a", "b"),
            ("b", "a"),
            ("p", "q"),
            ("q", "r"),
            ("r", "s"),
            ("s", "p"),
        ]);
        let cycles = cycles_of(&g);
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].cycle.size(), 4);
        assert_eq!(cycles[0].cycle.severity, CycleSeverity::High);
        assert_eq!(cycles[1].cycle.size(), 2);
    }
}
