//! Execution backends for coupling counts and cycle detection.
//!
//! Small and medium graphs run in memory. Past the configured module count
//! the relational backend answers the same two questions with SQL, trading
//! exact SCCs for depth-bounded reachability.

pub mod in_memory;
pub mod relational;

use petgraph::stable_graph::NodeIndex;
use strata_core::config::CouplingConfig;
use strata_core::errors::CouplingError;

use super::graph::ModuleGraph;
use super::martin_metrics::CouplingCounts;
use super::types::{BackendKind, CycleStatus};

pub use in_memory::InMemoryBackend;
pub use relational::RelationalBackend;

/// Strongly connected components and how far to trust them.
#[derive(Debug, Clone)]
pub struct SccResult {
    pub components: Vec<Vec<NodeIndex>>,
    pub status: CycleStatus,
}

pub trait CouplingBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// (Ca, Ce) per module over distinct neighbors, self-loops excluded.
    fn coupling_counts(&self, graph: &ModuleGraph) -> Result<CouplingCounts, CouplingError>;

    /// Components to test for cycles. May omit acyclic singletons.
    fn strongly_connected(&self, graph: &ModuleGraph) -> Result<SccResult, CouplingError>;
}

/// Relational once the module count reaches the threshold.
pub fn choose_backend(module_count: usize, threshold: usize) -> BackendKind {
    if module_count >= threshold {
        BackendKind::Relational
    } else {
        BackendKind::InMemory
    }
}

pub fn open_backend(kind: BackendKind, config: &CouplingConfig) -> Result<Box<dyn CouplingBackend>, CouplingError> {
    match kind {
        BackendKind::InMemory => Ok(Box::new(InMemoryBackend)),
        BackendKind::Relational => Ok(Box::new(RelationalBackend::open(
            config.effective_relational_max_depth(),
        )?)),
    }
}

/// Pick and open the backend for a graph of `module_count` modules.
pub fn select_backend(
    module_count: usize,
    config: &CouplingConfig,
) -> Result<Box<dyn CouplingBackend>, CouplingError> {
    let kind = choose_backend(module_count, config.effective_backend_threshold());
    tracing::debug!(module_count, backend = kind.name(), "selected coupling backend");
    open_backend(kind, config)
}
