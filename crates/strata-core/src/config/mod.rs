//! Configuration system for Strata.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod coupling_config;
pub mod storage_config;
pub mod strata_config;

pub use coupling_config::{
    CouplingConfig, CycleThresholds, Granularity, HealthWeights, ZoneThresholds,
};
pub use storage_config::StorageConfig;
pub use strata_config::{CliOverrides, StrataConfig};
