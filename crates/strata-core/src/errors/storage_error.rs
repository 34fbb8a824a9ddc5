//! Storage errors.

use super::error_code::{self, StrataErrorCode};

/// Errors raised by the SQLite persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration to v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    /// The run was rolled back; nothing from it is readable.
    #[error("Transaction rolled back: {message}")]
    TransactionFailed { message: String },

    #[error("Serialization error for {field}: {message}")]
    Serialization { field: String, message: String },
}

impl StrataErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } | Self::Serialization { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::TransactionFailed { .. } => error_code::TRANSACTION_FAILED,
        }
    }
}
