//! Translation from legacy records to the values bound into SQLite columns.
//!
//! Monster columns are all TEXT: strings are stored as-is, other JSON
//! scalars as their JSON text, arrays and objects as compact JSON. Images
//! arrive as `data:` URLs and are stored as raw bytes.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rusqlite::types::Value;
use serde_json::Value as Json;
use tavern_core::legacy::{LegacyMap, LegacyMonster};

use crate::{Result, schema::MONSTER_COLUMNS};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn json_text(v: Option<&Json>) -> Option<String> {
  match v? {
    Json::Null => None,
    Json::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URL. A bare
/// base64 string is accepted too.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
  let payload = match url.strip_prefix("data:") {
    Some(rest) => rest.split_once(',').map_or(rest, |(_, data)| data),
    None => url,
  };
  Ok(B64.decode(payload.trim())?)
}

/// Image bytes from an old image column, which held either bytes or a
/// `data:` URL. Text that is not decodable is kept as its UTF-8 bytes.
pub fn image_bytes(v: Value) -> Value {
  match v {
    Value::Text(s) => match decode_data_url(&s) {
      Ok(bytes) => Value::Blob(bytes),
      Err(_) => Value::Blob(s.into_bytes()),
    },
    other => other,
  }
}

// ─── Monsters ────────────────────────────────────────────────────────────────

/// Values for [`MONSTER_COLUMNS`]; the `id` column takes `id` rather than
/// whatever the record carried.
pub fn monster_values(monster: &LegacyMonster, id: &str) -> Vec<Option<String>> {
  MONSTER_COLUMNS
    .iter()
    .map(|&column| match column {
      "id" => Some(id.to_owned()),
      _ => json_text(monster.field(column)),
    })
    .collect()
}

// ─── Maps ────────────────────────────────────────────────────────────────────

/// A `maps` row as written by the importer. Song and campaign links did not
/// exist in legacy snapshots and stay NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRow {
  pub id:              String,
  pub name:            Option<String>,
  pub group_name:      Option<String>,
  pub url:             Option<String>,
  pub image_path:      Option<String>,
  pub image_data:      Option<Vec<u8>>,
  pub keep_open:       i64,
  pub zoom:            f64,
  pub rotation:        f64,
  pub pan_x:           f64,
  pub pan_y:           f64,
  pub original_width:  Option<i64>,
  pub original_height: Option<i64>,
  pub notes:           Option<String>,
}

impl MapRow {
  pub fn from_legacy(map: LegacyMap, id: String) -> Result<Self> {
    let image_data = map
      .image_data
      .as_deref()
      .filter(|s| !s.is_empty())
      .map(decode_data_url)
      .transpose()?;

    Ok(Self {
      id,
      name: map.name,
      group_name: map.group,
      url: map.url,
      image_path: map.image_path,
      image_data,
      keep_open: i64::from(map.keep_open.unwrap_or(false)),
      zoom: map.zoom.unwrap_or(1.0),
      rotation: map.rotation.unwrap_or(0.0),
      pan_x: map.pan_x.unwrap_or(0.0),
      pan_y: map.pan_y.unwrap_or(0.0),
      original_width: map.original_width,
      original_height: map.original_height,
      notes: map.notes,
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn json_text_stringifies_scalars() {
    assert_eq!(json_text(Some(&json!("Goblin"))), Some("Goblin".into()));
    assert_eq!(json_text(Some(&json!(15))), Some("15".into()));
    assert_eq!(json_text(Some(&json!([{"name": "Bite"}]))), Some(r#"[{"name":"Bite"}]"#.into()));
    assert_eq!(json_text(Some(&Json::Null)), None);
    assert_eq!(json_text(None), None);
  }

  #[test]
  fn data_url_prefix_is_stripped() {
    assert_eq!(decode_data_url("data:image/png;base64,aGk=").unwrap(), b"hi");
    assert_eq!(decode_data_url("aGk=").unwrap(), b"hi");
    assert!(decode_data_url("data:image/png;base64,@@@").is_err());
  }

  #[test]
  fn map_defaults_for_missing_view_state() {
    let legacy: LegacyMap = serde_json::from_value(json!({ "name": "Road" })).unwrap();
    let row = MapRow::from_legacy(legacy, "map_1".into()).unwrap();
    assert_eq!(row.zoom, 1.0);
    assert_eq!(row.rotation, 0.0);
    assert_eq!(row.keep_open, 0);
    assert!(row.image_data.is_none());
  }

  #[test]
  fn undecodable_image_text_is_kept() {
    assert_eq!(image_bytes(Value::Text("not base64!".into())), Value::Blob(b"not base64!".to_vec()));
    assert_eq!(image_bytes(Value::Null), Value::Null);
  }
}
