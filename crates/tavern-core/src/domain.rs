//! The datasets that exist as legacy flat files and are imported once into
//! their relational tables.

use std::{fmt, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

/// One logical dataset, migrated and imported independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
  Monsters,
  Maps,
  Shops,
}

impl Domain {
  /// Import order. Independent domains, so this only fixes log ordering.
  pub const ALL: [Domain; 3] = [Domain::Monsters, Domain::Maps, Domain::Shops];

  /// Destination table whose row count gates the import.
  pub fn table(self) -> &'static str {
    match self {
      Domain::Monsters => "monsters",
      Domain::Maps => "maps",
      Domain::Shops => "shops",
    }
  }

  /// File name of the legacy snapshot inside the data directory.
  pub fn file_name(self) -> &'static str {
    match self {
      Domain::Monsters => "monsters.json",
      Domain::Maps => "maps.json",
      Domain::Shops => "shops.json",
    }
  }

  /// Prefix used when minting ids for records of this domain.
  pub fn id_prefix(self) -> &'static str {
    match self {
      Domain::Monsters => "monster",
      Domain::Maps => "map",
      Domain::Shops => "shop",
    }
  }
}

impl fmt::Display for Domain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.table())
  }
}

// ─── Paths ────────────────────────────────────────────────────────────────────

/// Locations of the three legacy snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPaths {
  pub monsters: PathBuf,
  pub maps:     PathBuf,
  pub shops:    PathBuf,
}

impl LegacyPaths {
  /// Conventional layout: every snapshot lives in `dir` under its
  /// [`Domain::file_name`].
  pub fn in_dir(dir: impl AsRef<Path>) -> Self {
    let dir = dir.as_ref();
    Self {
      monsters: dir.join(Domain::Monsters.file_name()),
      maps:     dir.join(Domain::Maps.file_name()),
      shops:    dir.join(Domain::Shops.file_name()),
    }
  }

  pub fn get(&self, domain: Domain) -> &Path {
    match domain {
      Domain::Monsters => &self.monsters,
      Domain::Maps => &self.maps,
      Domain::Shops => &self.shops,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn in_dir_joins_file_names() {
    let paths = LegacyPaths::in_dir("/data");
    assert_eq!(paths.get(Domain::Monsters), Path::new("/data/monsters.json"));
    assert_eq!(paths.get(Domain::Maps), Path::new("/data/maps.json"));
    assert_eq!(paths.get(Domain::Shops), Path::new("/data/shops.json"));
  }

  #[test]
  fn display_is_table_name() {
    assert_eq!(Domain::Shops.to_string(), "shops");
  }
}
