//! Server configuration, layered from an optional TOML file and `TAVERN_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use tavern_core::{domain::LegacyPaths, settings::Settings};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
  /// Directory holding `monsters.json`, `maps.json` and `shops.json`.
  pub legacy_dir:    PathBuf,
  pub settings:      Settings,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_string(),
      port:          5280,
      database_path: PathBuf::from("tavern.db"),
      legacy_dir:    PathBuf::from("."),
      settings:      Settings::default(),
    }
  }
}

impl ServerConfig {
  /// Read `file` (if it exists) and overlay the environment.
  /// `TAVERN_SETTINGS__SONG_PRIORITY=map` sets a nested key.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder().add_source(config::File::from(file).required(false)),
    )
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> anyhow::Result<Self> {
    builder
      .add_source(
        config::Environment::with_prefix("TAVERN")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn database_path(&self) -> PathBuf { expand_tilde(&self.database_path) }

  pub fn legacy_paths(&self) -> LegacyPaths { LegacyPaths::in_dir(expand_tilde(&self.legacy_dir)) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use tavern_core::settings::SongPriority;

  use super::*;

  fn from_toml(toml: &str) -> ServerConfig {
    ServerConfig::from_builder(
      config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml)),
    )
    .unwrap()
  }

  #[test]
  fn missing_keys_fall_back_to_defaults() {
    let cfg = from_toml("port = 9000");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.database_path, PathBuf::from("tavern.db"));
    assert_eq!(cfg.settings.song_priority, SongPriority::Encounter);
  }

  #[test]
  fn nested_settings_table() {
    let cfg = from_toml(
      r#"
      legacy_dir = "/srv/tavern/legacy"

      [settings]
      song_priority = "map"
      "#,
    );
    assert_eq!(cfg.settings.song_priority, SongPriority::Map);
    assert_eq!(
      cfg.legacy_paths().get(tavern_core::domain::Domain::Shops),
      Path::new("/srv/tavern/legacy/shops.json")
    );
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/tavern.toml")).unwrap();
    assert_eq!(cfg.address(), format!("{}:{}", cfg.host, cfg.port));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/tavern.db")), PathBuf::from(home).join("tavern.db"));
    assert_eq!(expand_tilde(Path::new("/abs/tavern.db")), PathBuf::from("/abs/tavern.db"));
  }
}
