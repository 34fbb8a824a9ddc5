//! Error handling for Strata.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod coupling_error;
pub mod error_code;
pub mod storage_error;

pub use config_error::ConfigError;
pub use coupling_error::CouplingError;
pub use error_code::StrataErrorCode;
pub use storage_error::StorageError;
