//! [`SqliteStore`], the async handle the server holds, and the startup
//! sequence it runs before anything else touches the database.

use std::{collections::BTreeMap, path::Path};

use rusqlite::Connection;
use serde::Serialize;
use tavern_core::domain::LegacyPaths;

use crate::{
  Result,
  import::{ImportReport, import_legacy},
  migrate::{MigrationReport, column_names, run_migrations},
  schema::TABLES,
};

// ─── Startup ─────────────────────────────────────────────────────────────────

/// What the startup sequence did, for logs and the status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartupReport {
  pub migrations: MigrationReport,
  pub imports:    ImportReport,
}

/// Migrate the schema, then import legacy snapshots into empty tables.
///
/// Schema errors are returned; import errors are recorded in the report and
/// leave only their own domain empty.
pub fn run_startup(conn: &mut Connection, paths: &LegacyPaths) -> Result<StartupReport> {
  let migrations = run_migrations(conn)?;
  let imports = import_legacy(conn, paths);
  Ok(StartupReport { migrations, imports })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tavern store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) the database at `path`. The schema is not touched
  /// until [`SqliteStore::bootstrap`] runs.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.configure().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.configure().await?;
    Ok(store)
  }

  async fn configure(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run [`run_startup`] on the connection's worker thread.
  pub async fn bootstrap(&self, paths: LegacyPaths) -> Result<StartupReport> {
    self
      .conn
      .call(move |conn| Ok(run_startup(conn, &paths)))
      .await?
  }

  /// Row count of every table in the current model.
  pub async fn table_counts(&self) -> Result<BTreeMap<String, i64>> {
    let counts = self
      .conn
      .call(|conn| {
        let mut counts = BTreeMap::new();
        for table in TABLES {
          let n: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))?;
          counts.insert((*table).to_owned(), n);
        }
        Ok(counts)
      })
      .await?;
    Ok(counts)
  }

  /// Column names of `table`, in declaration order.
  pub async fn columns(&self, table: &str) -> Result<Vec<String>> {
    let table = table.to_owned();
    self
      .conn
      .call(move |conn| Ok(column_names(conn, &table)))
      .await?
  }
}
