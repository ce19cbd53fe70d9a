//! Error type for `tavern-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tavern_core::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("base64 error: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("failed to read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Table and column names are interpolated into DDL, so they are limited
  /// to plain identifiers.
  #[error("invalid sql identifier: {0:?}")]
  InvalidIdentifier(String),

  /// The shadow table of a shape migration did not receive every row.
  #[error("shape migration of {table} copied {actual} of {expected} rows")]
  RowCountMismatch {
    table:    String,
    expected: i64,
    actual:   i64,
  },

  /// The old table has columns the target shape would not carry over.
  #[error("shape migration of {table} would drop columns {columns:?}")]
  UnmappedColumns {
    table:   String,
    columns: Vec<String>,
  },

  #[error("shape migration of {table} introduced foreign key violations ({before} before, {after} after)")]
  ForeignKeyViolation {
    table:  String,
    before: i64,
    after:  i64,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
