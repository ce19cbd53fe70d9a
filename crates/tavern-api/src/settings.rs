//! `GET /settings`

use axum::{Json, extract::State};
use tavern_core::settings::Settings;

use crate::AppState;

pub async fn handler(State(state): State<AppState>) -> Json<Settings> {
  Json(state.settings.as_ref().clone())
}
