//! Tavern server binary.
//!
//! Reads `tavern.toml` (or the path given with `--config`), brings the SQLite
//! database up to the current schema, imports any legacy JSON snapshots into
//! empty tables, and serves the JSON API under `/api`.
//!
//! Schema errors abort startup before the listener is bound. Import failures
//! are logged and leave only their own domain empty.

mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use tavern_api::AppState;
use tavern_core::settings::SongPriority;
use tavern_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Tavern campaign server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tavern.toml")]
  config: PathBuf,

  /// Migrate the schema and import legacy snapshots, then exit.
  #[arg(long)]
  migrate_only: bool,

  /// Override `settings.song_priority` from the configuration.
  #[arg(long)]
  song_priority: Option<SongPriority>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut server_cfg = ServerConfig::load(&cli.config)?;
  if let Some(priority) = cli.song_priority {
    server_cfg.settings.song_priority = priority;
  }

  let db_path = server_cfg.database_path();
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open database at {db_path:?}"))?;

  let startup = store
    .bootstrap(server_cfg.legacy_paths())
    .await
    .context("schema migration failed; refusing to start")?;

  for (domain, error) in startup.imports.failures() {
    tracing::error!(%domain, %error, "legacy import failed");
  }
  tracing::info!(
    migration_steps = startup.migrations.steps.len(),
    song_priority = %server_cfg.settings.song_priority,
    "database ready"
  );

  if cli.migrate_only {
    return Ok(());
  }

  let state = AppState {
    store:    Arc::new(store),
    startup:  Arc::new(startup),
    settings: Arc::new(server_cfg.settings.clone()),
  };

  let app = Router::new()
    .nest("/api", tavern_api::api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
