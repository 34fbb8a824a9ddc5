//! Top-level Strata configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{CouplingConfig, Granularity, StorageConfig};
use crate::constants;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`STRATA_*`)
/// 3. Project config (`strata.toml` in project root)
/// 4. User config (`~/.strata/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StrataConfig {
    pub coupling: CouplingConfig,
    pub storage: StorageConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub granularity: Option<Granularity>,
    pub hotspot_threshold: Option<u32>,
    pub backend_threshold: Option<usize>,
    pub incremental: Option<bool>,
    pub database_path: Option<String>,
}

impl StrataConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        Self::load_with_user_config(root, Self::user_config_path().as_deref(), cli_overrides)
    }

    /// Same as [`StrataConfig::load`] with an explicit user config location.
    pub fn load_with_user_config(
        root: &Path,
        user_config: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // User config: parse errors are fatal, unreadable files are not.
        if let Some(user_config_path) = user_config {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join(constants::PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &StrataConfig) -> Result<(), ConfigError> {
        let coupling = &config.coupling;

        if coupling.effective_hotspot_threshold() == 0 {
            return Err(validation("coupling.hotspot_threshold", "must be greater than 0"));
        }
        if coupling.effective_backend_threshold() == 0 {
            return Err(validation("coupling.backend_threshold", "must be greater than 0"));
        }
        if coupling.effective_relational_max_depth() == 0 {
            return Err(validation("coupling.relational_max_depth", "must be greater than 0"));
        }
        if coupling.effective_impact_max_depth() == 0 {
            return Err(validation("coupling.impact_max_depth", "must be greater than 0"));
        }

        let zones = coupling.effective_zone_thresholds();
        for (field, value) in [
            ("coupling.zones.pain_instability_max", zones.pain_instability_max),
            ("coupling.zones.pain_abstractness_max", zones.pain_abstractness_max),
            ("coupling.zones.uselessness_instability_min", zones.uselessness_instability_min),
            ("coupling.zones.uselessness_abstractness_min", zones.uselessness_abstractness_min),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(validation(field, "must be between 0.0 and 1.0"));
            }
        }

        let cycles = coupling.effective_cycle_thresholds();
        if !(cycles.critical_above > cycles.high_above && cycles.high_above > cycles.medium_above) {
            return Err(validation(
                "coupling.cycles",
                "thresholds must satisfy critical_above > high_above > medium_above",
            ));
        }

        let weights = coupling.effective_health_weights();
        for (name, value) in weights.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("coupling.health_weights.{name}"),
                    message: format!("weight must be a non-negative number, got {value}"),
                });
            }
        }
        if (weights.sum() - 1.0).abs() > constants::WEIGHT_SUM_EPSILON {
            return Err(ConfigError::ValidationFailed {
                field: "coupling.health_weights".to_string(),
                message: format!("weights must sum to 1.0, got {:.6}", weights.sum()),
            });
        }

        for pattern in &coupling.test_patterns {
            if pattern.trim().is_empty() {
                return Err(validation("coupling.test_patterns", "patterns must not be empty"));
            }
        }

        Ok(())
    }

    /// Returns the user config path: `~/.strata/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(constants::USER_CONFIG_DIR).join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut StrataConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: StrataConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins only where it has a value.
    fn merge(base: &mut StrataConfig, other: &StrataConfig) {
        let (b, o) = (&mut base.coupling, &other.coupling);
        if o.granularity.is_some() {
            b.granularity = o.granularity;
        }
        if !o.package_manifests.is_empty() {
            b.package_manifests = o.package_manifests.clone();
        }
        if o.hotspot_threshold.is_some() {
            b.hotspot_threshold = o.hotspot_threshold;
        }
        if o.backend_threshold.is_some() {
            b.backend_threshold = o.backend_threshold;
        }
        if o.relational_max_depth.is_some() {
            b.relational_max_depth = o.relational_max_depth;
        }
        if o.impact_max_depth.is_some() {
            b.impact_max_depth = o.impact_max_depth;
        }
        if o.zones.is_some() {
            b.zones = o.zones;
        }
        if o.cycles.is_some() {
            b.cycles = o.cycles;
        }
        if o.health_weights.is_some() {
            b.health_weights = o.health_weights;
        }
        if !o.test_patterns.is_empty() {
            b.test_patterns = o.test_patterns.clone();
        }
        if o.incremental.is_some() {
            b.incremental = o.incremental;
        }

        if other.storage.database_path.is_some() {
            base.storage.database_path = other.storage.database_path.clone();
        }
        if other.storage.retain_runs.is_some() {
            base.storage.retain_runs = other.storage.retain_runs;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `STRATA_COUPLING_HOTSPOT_THRESHOLD`, `STRATA_STORAGE_DATABASE_PATH`, etc.
    fn apply_env_overrides(config: &mut StrataConfig) {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok());
    }

    /// Apply `STRATA_*` overrides from an arbitrary lookup. Values that fail
    /// to parse are ignored.
    pub fn apply_overrides_from<F>(config: &mut StrataConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STRATA_COUPLING_GRANULARITY").and_then(|s| Granularity::parse(&s)) {
            config.coupling.granularity = Some(v);
        }
        if let Some(v) = lookup("STRATA_COUPLING_HOTSPOT_THRESHOLD").and_then(|s| s.parse().ok()) {
            config.coupling.hotspot_threshold = Some(v);
        }
        if let Some(v) = lookup("STRATA_COUPLING_BACKEND_THRESHOLD").and_then(|s| s.parse().ok()) {
            config.coupling.backend_threshold = Some(v);
        }
        if let Some(v) = lookup("STRATA_COUPLING_RELATIONAL_MAX_DEPTH").and_then(|s| s.parse().ok()) {
            config.coupling.relational_max_depth = Some(v);
        }
        if let Some(v) = lookup("STRATA_COUPLING_INCREMENTAL").and_then(|s| s.parse().ok()) {
            config.coupling.incremental = Some(v);
        }
        if let Some(v) = lookup("STRATA_STORAGE_DATABASE_PATH") {
            config.storage.database_path = Some(v);
        }
        if let Some(v) = lookup("STRATA_STORAGE_RETAIN_RUNS").and_then(|s| s.parse().ok()) {
            config.storage.retain_runs = Some(v);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut StrataConfig, cli: &CliOverrides) {
        if let Some(v) = cli.granularity {
            config.coupling.granularity = Some(v);
        }
        if let Some(v) = cli.hotspot_threshold {
            config.coupling.hotspot_threshold = Some(v);
        }
        if let Some(v) = cli.backend_threshold {
            config.coupling.backend_threshold = Some(v);
        }
        if let Some(v) = cli.incremental {
            config.coupling.incremental = Some(v);
        }
        if let Some(ref v) = cli.database_path {
            config.storage.database_path = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn validation(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
