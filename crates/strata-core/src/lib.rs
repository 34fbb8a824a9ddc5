//! Shared foundation for the Strata workspace: error enums, layered
//! configuration, tracing setup, collection aliases and default constants.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

pub use config::StrataConfig;
pub use errors::StrataErrorCode;
