//! Compiled defaults shared across crates.

/// Ca + Ce at or above this marks a module as a hotspot.
pub const DEFAULT_HOTSPOT_THRESHOLD: u32 = 3;

/// Module count at which the relational backend takes over.
pub const DEFAULT_BACKEND_THRESHOLD: usize = 5_000;

/// Recursion bound for relational reachability queries.
pub const DEFAULT_RELATIONAL_MAX_DEPTH: u32 = 10;

/// Caller-walk bound for impact analysis over a call graph.
pub const DEFAULT_IMPACT_MAX_DEPTH: u32 = 10;

/// Zone thresholds on the (I, A) plane.
pub const DEFAULT_PAIN_INSTABILITY_MAX: f64 = 0.3;
pub const DEFAULT_PAIN_ABSTRACTNESS_MAX: f64 = 0.3;
pub const DEFAULT_USELESSNESS_INSTABILITY_MIN: f64 = 0.7;
pub const DEFAULT_USELESSNESS_ABSTRACTNESS_MIN: f64 = 0.7;

/// D below this is on the main sequence.
pub const MAIN_SEQUENCE_DISTANCE: f64 = 0.3;

/// Cycle severity: member counts strictly above each bound.
pub const DEFAULT_CYCLE_CRITICAL_ABOVE: usize = 5;
pub const DEFAULT_CYCLE_HIGH_ABOVE: usize = 3;
pub const DEFAULT_CYCLE_MEDIUM_ABOVE: usize = 2;

/// Health score weights. Must sum to 1.0.
pub const DEFAULT_WEIGHT_CYCLES: f64 = 0.30;
pub const DEFAULT_WEIGHT_ZONES: f64 = 0.20;
pub const DEFAULT_WEIGHT_HOTSPOTS: f64 = 0.20;
pub const DEFAULT_WEIGHT_UNUSED_EXPORTS: f64 = 0.15;
pub const DEFAULT_WEIGHT_DISTANCE: f64 = 0.15;

/// Tolerance when checking that weights sum to 1.0.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Role thresholds never drop below this median.
pub const ROLE_MEDIAN_FLOOR: u32 = 2;

/// Distance delta below which a trend is considered stable.
pub const TREND_TOLERANCE: f64 = 0.05;

/// Manifests that mark a package root under package granularity.
pub const DEFAULT_PACKAGE_MANIFESTS: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "setup.py",
    "go.mod",
    "pom.xml",
    "build.gradle",
];

/// Default database location relative to the project root.
pub const DEFAULT_DATABASE_PATH: &str = ".strata/strata.db";

/// Persisted runs kept by retention.
pub const DEFAULT_RETAIN_RUNS: u32 = 20;

/// Config file names.
pub const PROJECT_CONFIG_FILE: &str = "strata.toml";
pub const USER_CONFIG_DIR: &str = ".strata";
