//! Storage configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database path, relative to the project root unless absolute.
    /// Default: `.strata/strata.db`.
    pub database_path: Option<String>,
    /// Number of persisted runs retained. Default: 20.
    pub retain_runs: Option<u32>,
}

impl StorageConfig {
    /// Resolves the database path against `root`.
    pub fn effective_database_path(&self, root: &Path) -> PathBuf {
        let raw = self
            .database_path
            .as_deref()
            .unwrap_or(constants::DEFAULT_DATABASE_PATH);
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    pub fn effective_retain_runs(&self) -> u32 {
        self.retain_runs.unwrap_or(constants::DEFAULT_RETAIN_RUNS)
    }
}
