//! Coupling engine errors.
//!
//! Unresolvable imports and files outside any module are not errors: the
//! builder drops them and logs. Only conditions a caller must act on live here.

use super::error_code::{self, StrataErrorCode};
use super::{ConfigError, StorageError};

/// Errors surfaced by the coupling analysis pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CouplingError {
    #[error("Module not found: {path}")]
    ModuleNotFound { path: String },

    #[error("Backend unavailable ({backend}): {message}")]
    BackendUnavailable { backend: String, message: String },

    #[error("Backend query failed: {message}")]
    Backend { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StrataErrorCode for CouplingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ModuleNotFound { .. } => error_code::MODULE_NOT_FOUND,
            Self::BackendUnavailable { .. } => error_code::BACKEND_UNAVAILABLE,
            Self::Backend { .. } => error_code::COUPLING_ERROR,
            Self::Storage(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}
