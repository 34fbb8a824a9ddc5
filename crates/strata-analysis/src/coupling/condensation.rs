//! Condensation graph: every SCC collapsed to one node.
//!
//! The result is a DAG whenever the SCCs are exact. Topological order over
//! it gives a build order in which dependencies come before dependents.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex as CondensedIndex};
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use strata_core::types::collections::FxHashMap;

use super::graph::ModuleGraph;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondensedNode {
    /// Member paths, sorted.
    pub members: Vec<String>,
    pub is_cycle: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CondensationGraph {
    graph: DiGraph<CondensedNode, u32>,
}

impl CondensationGraph {
    /// Collapse `components` (a partition of the module graph) into a DAG.
    /// Edge weights count the original edges between two components.
    pub fn build(graph: &ModuleGraph, components: &[Vec<NodeIndex>]) -> Self {
        let mut condensed: DiGraph<CondensedNode, u32> = DiGraph::new();
        let mut owner: FxHashMap<NodeIndex, CondensedIndex> = FxHashMap::default();

        for component in components {
            let mut members: Vec<String> = component.iter().map(|&n| graph.path_of(n).to_string()).collect();
            members.sort();
            let is_cycle = component.len() > 1 || component.first().is_some_and(|&n| graph.has_self_loop(n));
            let idx = condensed.add_node(CondensedNode { members, is_cycle });
            for &n in component {
                owner.insert(n, idx);
            }
        }

        let mut weights: FxHashMap<(CondensedIndex, CondensedIndex), u32> = FxHashMap::default();
        for (source, target) in graph.distinct_edge_pairs() {
            let (Some(&from), Some(&to)) = (owner.get(&source), owner.get(&target)) else {
                continue;
            };
            if from != to {
                *weights.entry((from, to)).or_default() += 1;
            }
        }
        let mut edges: Vec<_> = weights.into_iter().collect();
        edges.sort_unstable_by_key(|((a, b), _)| (a.index(), b.index()));
        for ((from, to), weight) in edges {
            condensed.add_edge(from, to, weight);
        }

        Self { graph: condensed }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CondensedNode> {
        self.graph.node_weights()
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Components ordered so each one appears after everything it depends on.
    /// `None` if the component set was approximate and left a cycle behind.
    pub fn build_order(&self) -> Option<Vec<&CondensedNode>> {
        let order = toposort(&self.graph, None).ok()?;
        Some(order.into_iter().rev().map(|idx| &self.graph[idx]).collect())
    }

    /// The cycle with the most members, ties broken by first member path.
    pub fn largest_cluster(&self) -> Option<&CondensedNode> {
        self.graph
            .node_weights()
            .filter(|n| n.is_cycle)
            .max_by(|a, b| {
                a.members
                    .len()
                    .cmp(&b.members.len())
                    .then_with(|| b.members.first().cmp(&a.members.first()))
            })
    }
}
