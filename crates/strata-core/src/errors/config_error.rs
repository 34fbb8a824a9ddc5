//! Configuration errors.

use super::error_code::{self, StrataErrorCode};

/// Raised while loading `strata.toml` layers or validating the merged result.
/// Field names use dotted TOML paths such as `coupling.zones.pain_instability_max`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}: no such config file")]
    FileNotFound { path: String },

    #[error("{path}: invalid TOML: {message}")]
    ParseError { path: String, message: String },

    /// Individually valid values that are inconsistent together.
    #[error("{field}: {message}")]
    ValidationFailed { field: String, message: String },

    /// A single value outside its allowed range.
    #[error("{field} out of range: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    /// The dotted config key at fault, when the error names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationFailed { field, .. } | Self::InvalidValue { field, .. } => Some(field),
            Self::FileNotFound { .. } | Self::ParseError { .. } => None,
        }
    }
}

impl StrataErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
