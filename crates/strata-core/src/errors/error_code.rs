//! Stable machine-readable error codes.

/// Every error enum implements this so callers outside Rust (report
/// writers, quality gates) can branch on a code instead of a message.
pub trait StrataErrorCode {
    /// Returns the error code string (e.g., "STORAGE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const TRANSACTION_FAILED: &str = "TRANSACTION_FAILED";
pub const MODULE_NOT_FOUND: &str = "MODULE_NOT_FOUND";
pub const BACKEND_UNAVAILABLE: &str = "BACKEND_UNAVAILABLE";
pub const COUPLING_ERROR: &str = "COUPLING_ERROR";
