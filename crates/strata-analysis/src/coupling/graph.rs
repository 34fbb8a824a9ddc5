//! Module dependency graph: a `StableGraph` with O(1) path lookup.
//!
//! `StableGraph` keeps node indices valid across edge removal, which the
//! incremental coordinator relies on when it rewires a changed module.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use strata_core::types::collections::{FxHashMap, FxHashSet, SymbolList};

use super::facts::ExportKind;

/// An export aggregated onto its module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleExport {
    pub name: String,
    pub kind: ExportKind,
    pub file: String,
    pub line: u32,
    pub is_default: bool,
    pub is_type_only: bool,
}

impl ModuleExport {
    pub fn is_abstract(&self) -> bool {
        self.is_type_only || self.kind.is_abstract()
    }
}

/// One unit of coupling measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleNode {
    pub path: String,
    pub language: Option<String>,
    /// Constituent files, sorted.
    pub files: Vec<String>,
    /// Content hash per file, aligned with `files`.
    pub file_hashes: Vec<u64>,
    pub exports: Vec<ModuleExport>,
}

impl ModuleNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: None,
            files: Vec::new(),
            file_hashes: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn abstract_export_count(&self) -> usize {
        self.exports.iter().filter(|e| e.is_abstract()).count()
    }
}

/// One import statement from `source` to `target`. Parallel edges are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub symbols: SymbolList,
    pub is_type_only: bool,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    graph: StableGraph<ModuleNode, DependencyEdge>,
    path_index: FxHashMap<String, NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, replacing the data of an existing node with the same path.
    pub fn add_module(&mut self, node: ModuleNode) -> NodeIndex {
        if let Some(&idx) = self.path_index.get(&node.path) {
            if let Some(existing) = self.graph.node_weight_mut(idx) {
                *existing = node;
            }
            return idx;
        }
        let path = node.path.clone();
        let idx = self.graph.add_node(node);
        self.path_index.insert(path, idx);
        idx
    }

    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, edge: DependencyEdge) -> EdgeIndex {
        self.graph.add_edge(source, target, edge)
    }

    /// Drop every outgoing edge of `idx`, returning the distinct former targets.
    pub fn clear_outgoing(&mut self, idx: NodeIndex) -> FxHashSet<NodeIndex> {
        let edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        let mut targets = FxHashSet::default();
        for (edge, target) in edges {
            self.graph.remove_edge(edge);
            targets.insert(target);
        }
        targets
    }

    pub fn index_of(&self, path: &str) -> Option<NodeIndex> {
        self.path_index.get(path).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&ModuleNode> {
        self.graph.node_weight(idx)
    }

    pub fn module(&self, path: &str) -> Option<&ModuleNode> {
        self.index_of(path).and_then(|idx| self.node(idx))
    }

    /// Path of `idx`, or empty for a stale index.
    pub fn path_of(&self, idx: NodeIndex) -> &str {
        self.graph.node_weight(idx).map(|n| n.path.as_str()).unwrap_or("")
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node indices ordered by module path.
    pub fn sorted_indices(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by(|a, b| self.path_of(*a).cmp(self.path_of(*b)));
        indices
    }

    /// Distinct neighbors in `direction`, excluding `idx` itself.
    pub fn distinct_neighbors(&self, idx: NodeIndex, direction: Direction) -> FxHashSet<NodeIndex> {
        self.graph
            .neighbors_directed(idx, direction)
            .filter(|&n| n != idx)
            .collect()
    }

    /// Distinct neighbor paths in `direction`, sorted, excluding `idx` itself.
    pub fn neighbor_paths(&self, idx: NodeIndex, direction: Direction) -> Vec<String> {
        let mut paths: Vec<String> = self
            .distinct_neighbors(idx, direction)
            .into_iter()
            .map(|n| self.path_of(n).to_string())
            .collect();
        paths.sort();
        paths
    }

    /// (Ca, Ce) counted over distinct neighbors.
    pub fn coupling_counts(&self, idx: NodeIndex) -> (u32, u32) {
        let ca = self.distinct_neighbors(idx, Direction::Incoming).len() as u32;
        let ce = self.distinct_neighbors(idx, Direction::Outgoing).len() as u32;
        (ca, ce)
    }

    pub fn has_self_loop(&self, idx: NodeIndex) -> bool {
        self.graph.contains_edge(idx, idx)
    }

    /// All parallel edges from `source` to `target`.
    pub fn edges_between(&self, source: NodeIndex, target: NodeIndex) -> impl Iterator<Item = &DependencyEdge> {
        self.graph
            .edges_directed(source, Direction::Outgoing)
            .filter(move |e| e.target() == target)
            .map(|e| e.weight())
    }

    /// Incoming edges of `idx` with their source, self-loops included.
    pub fn incoming_edges(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, &DependencyEdge)> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
    }

    /// Every (source, target) pair with at least one edge.
    pub fn distinct_edge_pairs(&self) -> FxHashSet<(NodeIndex, NodeIndex)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .collect()
    }

    /// The underlying petgraph structure, for algorithms.
    pub fn inner(&self) -> &StableGraph<ModuleNode, DependencyEdge> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(file: &str) -> DependencyEdge {
        DependencyEdge {
            symbols: SymbolList::new(),
            is_type_only: false,
            file: file.to_string(),
            line: 1,
        }
    }

    #[test]
    fn add_module_dedupes_by_path() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(ModuleNode::new("src/a"));
        let mut replacement = ModuleNode::new("src/a");
        replacement.language = Some("rust".into());
        let again = graph.add_module(replacement);
        assert_eq!(a, again);
        assert_eq!(graph.module_count(), 1);
        assert_eq!(graph.module("src/a").unwrap().language.as_deref(), Some("rust"));
    }

    #[test]
    fn parallel_edges_count_once_for_coupling() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(ModuleNode::new("a"));
        let b = graph.add_module(ModuleNode::new("b"));
        graph.add_edge(a, b, edge("a/x.ts"));
        graph.add_edge(a, b, edge("a/y.ts"));
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.coupling_counts(a), (0, 1));
        assert_eq!(graph.coupling_counts(b), (1, 0));
        assert_eq!(graph.edges_between(a, b).count(), 2);
    }

    #[test]
    fn clear_outgoing_keeps_indices_stable() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(ModuleNode::new("a"));
        let b = graph.add_module(ModuleNode::new("b"));
        let c = graph.add_module(ModuleNode::new("c"));
        graph.add_edge(a, b, edge("a"));
        graph.add_edge(a, c, edge("a"));
        graph.add_edge(c, a, edge("c"));

        let former = graph.clear_outgoing(a);
        assert_eq!(former.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.index_of("c"), Some(c));
        assert_eq!(graph.coupling_counts(a), (1, 0));
    }

    #[test]
    fn self_loop_excluded_from_counts() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(ModuleNode::new("a"));
        graph.add_edge(a, a, edge("a"));
        assert!(graph.has_self_loop(a));
        assert_eq!(graph.coupling_counts(a), (0, 0));
    }
}
