//! Strata analysis engine: module dependency graphs and the coupling
//! metrics computed over them.

pub mod coupling;

pub use coupling::{CouplingAnalysis, CouplingAnalyzer, IncrementalCoordinator};
