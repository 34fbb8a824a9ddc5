//! Error codes and conversions.

use strata_core::errors::{ConfigError, CouplingError, StorageError, StrataErrorCode};

#[test]
fn storage_errors_map_to_distinct_codes() {
    let sqlite = StorageError::SqliteError { message: "locked".into() };
    let migration = StorageError::MigrationFailed { version: 1, message: "bad sql".into() };
    let tx = StorageError::TransactionFailed { message: "constraint".into() };
    assert_eq!(sqlite.error_code(), "STORAGE_ERROR");
    assert_eq!(migration.error_code(), "MIGRATION_FAILED");
    assert_eq!(tx.error_code(), "TRANSACTION_FAILED");
}

#[test]
fn coupling_error_wraps_storage_via_from() {
    fn persist() -> Result<(), CouplingError> {
        Err(StorageError::SqliteError { message: "disk I/O".into() })?;
        Ok(())
    }
    let err = persist().unwrap_err();
    assert_eq!(err.error_code(), "STORAGE_ERROR");
    assert!(err.to_string().contains("disk I/O"));
}

#[test]
fn coupling_error_wraps_config() {
    let err: CouplingError = ConfigError::InvalidValue {
        field: "coupling.hotspot_threshold".into(),
        message: "zero".into(),
    }
    .into();
    assert_eq!(err.error_code(), "CONFIG_ERROR");
}

#[test]
fn config_errors_name_the_offending_key() {
    let err = ConfigError::InvalidValue {
        field: "coupling.zones.pain_instability_max".into(),
        message: "1.5 not in [0, 1]".into(),
    };
    assert_eq!(err.field(), Some("coupling.zones.pain_instability_max"));
    assert_eq!(err.to_string(), "coupling.zones.pain_instability_max out of range: 1.5 not in [0, 1]");
    assert_eq!(ConfigError::FileNotFound { path: "strata.toml".into() }.field(), None);
}

#[test]
fn coded_string_prefixes_code() {
    let err = CouplingError::ModuleNotFound { path: "src/ghost".into() };
    assert_eq!(err.coded_string(), "[MODULE_NOT_FOUND] Module not found: src/ghost");
}
