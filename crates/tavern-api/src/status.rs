//! `GET /status`: the startup report plus live row counts.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use serde::Serialize;
use tavern_store_sqlite::{ImportReport, MigrationReport};

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct StatusBody {
  pub migrations: MigrationReport,
  pub imports:    ImportReport,
  pub tables:     BTreeMap<String, i64>,
}

pub async fn handler(State(state): State<AppState>) -> Result<Json<StatusBody>, ApiError> {
  let tables = state.store.table_counts().await?;
  Ok(Json(StatusBody {
    migrations: state.startup.migrations.clone(),
    imports: state.startup.imports.clone(),
    tables,
  }))
}
