//! Coupling analysis configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// How files are grouped into modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One module per file.
    File,
    /// One module per containing directory.
    #[default]
    Directory,
    /// One module per nearest package manifest, falling back to directory.
    Package,
}

impl Granularity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Package => "package",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "directory" | "dir" => Some(Self::Directory),
            "package" | "pkg" => Some(Self::Package),
            _ => None,
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Zone boundaries on the (instability, abstractness) plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneThresholds {
    pub pain_instability_max: f64,
    pub pain_abstractness_max: f64,
    pub uselessness_instability_min: f64,
    pub uselessness_abstractness_min: f64,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            pain_instability_max: constants::DEFAULT_PAIN_INSTABILITY_MAX,
            pain_abstractness_max: constants::DEFAULT_PAIN_ABSTRACTNESS_MAX,
            uselessness_instability_min: constants::DEFAULT_USELESSNESS_INSTABILITY_MIN,
            uselessness_abstractness_min: constants::DEFAULT_USELESSNESS_ABSTRACTNESS_MIN,
        }
    }
}

/// Member-count bounds for cycle severity. A cycle is Critical when its
/// size is strictly above `critical_above`, and so on down to Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleThresholds {
    pub critical_above: usize,
    pub high_above: usize,
    pub medium_above: usize,
}

impl Default for CycleThresholds {
    fn default() -> Self {
        Self {
            critical_above: constants::DEFAULT_CYCLE_CRITICAL_ABOVE,
            high_above: constants::DEFAULT_CYCLE_HIGH_ABOVE,
            medium_above: constants::DEFAULT_CYCLE_MEDIUM_ABOVE,
        }
    }
}

/// Weights of the five health-score penalty components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthWeights {
    pub cycles: f64,
    pub zones: f64,
    pub hotspots: f64,
    pub unused_exports: f64,
    pub distance: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            cycles: constants::DEFAULT_WEIGHT_CYCLES,
            zones: constants::DEFAULT_WEIGHT_ZONES,
            hotspots: constants::DEFAULT_WEIGHT_HOTSPOTS,
            unused_exports: constants::DEFAULT_WEIGHT_UNUSED_EXPORTS,
            distance: constants::DEFAULT_WEIGHT_DISTANCE,
        }
    }
}

impl HealthWeights {
    pub fn sum(&self) -> f64 {
        self.cycles + self.zones + self.hotspots + self.unused_exports + self.distance
    }

    pub(crate) fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("cycles", self.cycles),
            ("zones", self.zones),
            ("hotspots", self.hotspots),
            ("unused_exports", self.unused_exports),
            ("distance", self.distance),
        ]
    }
}

/// Configuration for the coupling engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CouplingConfig {
    /// Module granularity. Default: directory.
    pub granularity: Option<Granularity>,
    /// Manifest file names recognised under package granularity.
    #[serde(default)]
    pub package_manifests: Vec<String>,
    /// Hotspot threshold on Ca + Ce. Default: 3.
    pub hotspot_threshold: Option<u32>,
    /// Module count at which the relational backend is selected. Default: 5000.
    pub backend_threshold: Option<usize>,
    /// Depth bound for relational cycle approximation. Default: 10.
    pub relational_max_depth: Option<u32>,
    /// Depth bound for call-graph impact walks. Default: 10.
    pub impact_max_depth: Option<u32>,
    pub zones: Option<ZoneThresholds>,
    pub cycles: Option<CycleThresholds>,
    pub health_weights: Option<HealthWeights>,
    /// Glob patterns identifying test files for impact analysis.
    #[serde(default)]
    pub test_patterns: Vec<String>,
    /// Enable incremental analysis. Default: true.
    pub incremental: Option<bool>,
}

/// Test-file globs used when none are configured.
pub const DEFAULT_TEST_PATTERNS: &[&str] = &[
    "**/*.test.*",
    "**/*.spec.*",
    "**/*_test.*",
    "**/test_*.*",
    "**/tests/**",
    "**/__tests__/**",
];

impl CouplingConfig {
    pub fn effective_granularity(&self) -> Granularity {
        self.granularity.unwrap_or_default()
    }

    /// Returns the configured manifests, or the built-in list.
    pub fn effective_package_manifests(&self) -> Vec<String> {
        if self.package_manifests.is_empty() {
            constants::DEFAULT_PACKAGE_MANIFESTS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.package_manifests.clone()
        }
    }

    pub fn effective_hotspot_threshold(&self) -> u32 {
        self.hotspot_threshold
            .unwrap_or(constants::DEFAULT_HOTSPOT_THRESHOLD)
    }

    pub fn effective_backend_threshold(&self) -> usize {
        self.backend_threshold
            .unwrap_or(constants::DEFAULT_BACKEND_THRESHOLD)
    }

    pub fn effective_relational_max_depth(&self) -> u32 {
        self.relational_max_depth
            .unwrap_or(constants::DEFAULT_RELATIONAL_MAX_DEPTH)
    }

    pub fn effective_impact_max_depth(&self) -> u32 {
        self.impact_max_depth
            .unwrap_or(constants::DEFAULT_IMPACT_MAX_DEPTH)
    }

    pub fn effective_zone_thresholds(&self) -> ZoneThresholds {
        self.zones.unwrap_or_default()
    }

    pub fn effective_cycle_thresholds(&self) -> CycleThresholds {
        self.cycles.unwrap_or_default()
    }

    pub fn effective_health_weights(&self) -> HealthWeights {
        self.health_weights.unwrap_or_default()
    }

    pub fn effective_test_patterns(&self) -> Vec<String> {
        if self.test_patterns.is_empty() {
            DEFAULT_TEST_PATTERNS.iter().map(|s| s.to_string()).collect()
        } else {
            self.test_patterns.clone()
        }
    }

    pub fn effective_incremental(&self) -> bool {
        self.incremental.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CouplingConfig::default();
        assert_eq!(config.effective_granularity(), Granularity::Directory);
        assert_eq!(config.effective_hotspot_threshold(), 3);
        assert_eq!(config.effective_backend_threshold(), 5000);
        assert_eq!(config.effective_cycle_thresholds().critical_above, 5);
        assert!((config.effective_health_weights().sum() - 1.0).abs() < 1e-9);
        assert!(config.effective_incremental());
    }

    #[test]
    fn granularity_parse_accepts_aliases() {
        assert_eq!(Granularity::parse("DIR"), Some(Granularity::Directory));
        assert_eq!(Granularity::parse("pkg"), Some(Granularity::Package));
        assert_eq!(Granularity::parse("file"), Some(Granularity::File));
        assert_eq!(Granularity::parse("crate"), None);
    }
}
