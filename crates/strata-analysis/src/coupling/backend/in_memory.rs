//! In-memory backend over the petgraph store.

use rayon::prelude::*;
use strata_core::errors::CouplingError;

use super::{CouplingBackend, SccResult};
use crate::coupling::cycle_detection::strongly_connected_components;
use crate::coupling::graph::ModuleGraph;
use crate::coupling::martin_metrics::CouplingCounts;
use crate::coupling::types::{BackendKind, CycleStatus};

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackend;

impl CouplingBackend for InMemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::InMemory
    }

    fn coupling_counts(&self, graph: &ModuleGraph) -> Result<CouplingCounts, CouplingError> {
        Ok(graph
            .sorted_indices()
            .into_par_iter()
            .map(|idx| (idx, graph.coupling_counts(idx)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect())
    }

    fn strongly_connected(&self, graph: &ModuleGraph) -> Result<SccResult, CouplingError> {
        Ok(SccResult {
            components: strongly_connected_components(graph),
            status: CycleStatus::Complete,
        })
    }
}
