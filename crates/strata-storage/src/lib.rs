//! SQLite persistence for coupling runs.
//!
//! One writer connection behind a mutex, `PRAGMA user_version` migrations,
//! all-or-nothing run writes and keyset-paginated reads.

pub mod connection;
pub mod migrations;
pub mod pagination;
pub mod queries;
pub mod retention;

pub use connection::DatabaseManager;
