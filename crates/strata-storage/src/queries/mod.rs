//! Query modules, one per table group.

pub mod coupling;
pub mod runs;
