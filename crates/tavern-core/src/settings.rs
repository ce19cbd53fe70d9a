//! Application settings handed explicitly to the components that need them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Which soundtrack wins when both the active map and the active encounter
/// define one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongPriority {
  #[default]
  Encounter,
  Map,
}

impl FromStr for SongPriority {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "encounter" => Ok(SongPriority::Encounter),
      "map" => Ok(SongPriority::Map),
      other => Err(Error::UnknownSongPriority(other.to_owned())),
    }
  }
}

impl fmt::Display for SongPriority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      SongPriority::Encounter => "encounter",
      SongPriority::Map => "map",
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  #[serde(default)]
  pub song_priority: SongPriority,
}
