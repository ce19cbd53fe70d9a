//! Error types for `tavern-core`.

use thiserror::Error;

use crate::domain::Domain;

#[derive(Debug, Error)]
pub enum Error {
  /// A legacy snapshot did not contain the expected JSON structure.
  #[error("malformed legacy {domain} snapshot: {source}")]
  MalformedSnapshot {
    domain: Domain,
    #[source]
    source: serde_json::Error,
  },

  #[error("unknown song priority: {0:?}")]
  UnknownSongPriority(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
