//! Coupling analysis: Robert C. Martin metrics, Tarjan's SCC, zone and role
//! classification, cycle-breaking advice, refactor impact and health.
//!
//! Computes Ce (efferent), Ca (afferent), I (instability), A (abstractness)
//! and D (distance from main sequence) per module over a module graph built
//! from per-file import/export facts.

pub mod analyzer;
pub mod backend;
pub mod break_points;
pub mod builder;
pub mod condensation;
pub mod cycle_detection;
pub mod facts;
pub mod graph;
pub mod health;
pub mod impact;
pub mod incremental;
pub mod martin_metrics;
pub mod persistence;
pub mod roles;
pub mod types;
pub mod usage;
pub mod zones;

pub use analyzer::{CouplingAnalysis, CouplingAnalyzer};
pub use backend::{CouplingBackend, InMemoryBackend, RelationalBackend, SccResult};
pub use builder::{BuildOutput, GraphBuilder, ModuleAssigner};
pub use condensation::{CondensationGraph, CondensedNode};
pub use facts::{ExportFact, ExportKind, FileFacts, ImportFact, ImportResolver, RelativePathResolver};
pub use graph::ModuleGraph;
pub use impact::{CallGraphProvider, CallerRef, ImpactOptions};
pub use incremental::{IncrementalCoordinator, IncrementalMode, IncrementalOutcome};
pub use types::*;
pub use usage::{NameMatchUsageResolver, UsageResolver};
