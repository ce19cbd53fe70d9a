//! JSON API for Tavern.
//!
//! Exposes an axum [`Router`] over a bootstrapped [`SqliteStore`]: what the
//! startup sequence did, current row counts, and the effective settings.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tavern_api::api_router(state))
//! ```

pub mod error;
pub mod settings;
pub mod status;

use std::sync::Arc;

use axum::{Router, routing::get};
use tavern_core::settings::Settings;
use tavern_store_sqlite::{SqliteStore, StartupReport};

pub use error::ApiError;

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState {
  pub store:    Arc<SqliteStore>,
  pub startup:  Arc<StartupReport>,
  pub settings: Arc<Settings>,
}

/// Build the API router. The returned `Router<()>` can be nested into any
/// parent router.
pub fn api_router(state: AppState) -> Router<()> {
  Router::new()
    .route("/status", get(status::handler))
    .route("/settings", get(settings::handler))
    .with_state(state)
}
