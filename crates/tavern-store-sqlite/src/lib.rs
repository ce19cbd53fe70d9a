//! SQLite backend for the Tavern campaign store.
//!
//! Brings a database file of any historical shape up to the current schema
//! and performs the one-time import of legacy JSON snapshots. The migrator
//! and importer are synchronous functions over a [`rusqlite::Connection`];
//! [`SqliteStore`] runs them on the [`tokio_rusqlite`] worker thread.

mod encode;
mod store;

pub mod error;
pub mod import;
pub mod migrate;
pub mod schema;

pub use error::{Error, Result};
pub use import::{ImportOutcome, ImportReport, import_legacy};
pub use migrate::{MigrationReport, MigrationStep, run_migrations};
pub use store::{SqliteStore, StartupReport, run_startup};
