//! Export usage resolution.
//!
//! Decides which of a module's exports are used by its importers. The
//! default resolver matches names exactly; re-export aliases are not
//! followed. A resolver that understands aliasing can be swapped in.

use petgraph::stable_graph::NodeIndex;
use strata_core::types::collections::FxHashSet;

use super::graph::ModuleGraph;

/// Symbol name that marks a namespace import (`import * as x`).
pub const NAMESPACE_SYMBOL: &str = "*";
/// Symbol name recorded for default imports.
pub const DEFAULT_SYMBOL: &str = "default";

pub trait UsageResolver: Send + Sync {
    /// Indices into the module's `exports` that some importer uses.
    fn used_exports(&self, graph: &ModuleGraph, module: NodeIndex) -> FxHashSet<usize>;
}

/// Exact name matching over symbols imported by incoming edges.
///
/// A namespace import marks every export used. A default export is used
/// when an importer asks for `default` or for its declared name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatchUsageResolver;

impl UsageResolver for NameMatchUsageResolver {
    fn used_exports(&self, graph: &ModuleGraph, module: NodeIndex) -> FxHashSet<usize> {
        let Some(node) = graph.node(module) else {
            return FxHashSet::default();
        };

        let mut imported: FxHashSet<&str> = FxHashSet::default();
        for (source, edge) in graph.incoming_edges(module) {
            if source == module {
                continue;
            }
            imported.extend(edge.symbols.iter().map(String::as_str));
        }

        if imported.contains(NAMESPACE_SYMBOL) {
            return (0..node.exports.len()).collect();
        }

        node.exports
            .iter()
            .enumerate()
            .filter(|(_, export)| {
                imported.contains(export.name.as_str())
                    || (export.is_default && imported.contains(DEFAULT_SYMBOL))
            })
            .map(|(i, _)| i)
            .collect()
    }
}
