//! Legacy snapshot records: the pre-relational JSON shapes that the
//! importer reads once and translates into rows.
//!
//! The shapes are lenient: every field may be missing, ids may have been
//! written as numbers by older builds, and map view state may be stored as
//! 0/1 flags or numeric strings.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{Error, Result, domain::Domain};

/// A free-form JSON object.
pub type Record = Map<String, Value>;

/// Parse a snapshot file's contents as a JSON array of `T`.
pub fn parse_snapshot<T: DeserializeOwned>(domain: Domain, bytes: &[u8]) -> Result<Vec<T>> {
  serde_json::from_slice(bytes).map_err(|source| Error::MalformedSnapshot { domain, source })
}

// ─── Monsters ─────────────────────────────────────────────────────────────────

/// A monster whose keys already match the `monsters` columns, except that
/// charisma may be spelled `cha` instead of `car`.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct LegacyMonster(pub Record);

impl LegacyMonster {
  pub fn id(&self) -> Option<String> { self.0.get("id").and_then(id_from_value) }

  /// Value for a destination column, honouring the `cha` → `car` alias.
  pub fn field(&self, column: &str) -> Option<&Value> {
    match (column, self.0.get(column)) {
      ("car", None | Some(Value::Null)) => self.0.get("cha"),
      (_, value) => value,
    }
  }
}

// ─── Maps ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMap {
  #[serde(default, deserialize_with = "lenient_id")]
  pub id:              Option<String>,
  pub name:            Option<String>,
  /// Stored as `group_name` in the relational table.
  pub group:           Option<String>,
  pub url:             Option<String>,
  pub image_path:      Option<String>,
  #[serde(default, deserialize_with = "lenient_flag")]
  pub keep_open:       Option<bool>,
  #[serde(default, deserialize_with = "lenient_f64")]
  pub zoom:            Option<f64>,
  #[serde(default, deserialize_with = "lenient_f64")]
  pub rotation:        Option<f64>,
  #[serde(default, deserialize_with = "lenient_f64")]
  pub pan_x:           Option<f64>,
  #[serde(default, deserialize_with = "lenient_f64")]
  pub pan_y:           Option<f64>,
  pub notes:           Option<String>,
  /// `data:image/...;base64,` URL written by newer exports.
  #[serde(rename = "image_data")]
  pub image_data:      Option<String>,
  #[serde(default, deserialize_with = "lenient_i64")]
  pub original_width:  Option<i64>,
  #[serde(default, deserialize_with = "lenient_i64")]
  pub original_height: Option<i64>,
}

// ─── Shops ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyShop {
  #[serde(default, deserialize_with = "lenient_id")]
  pub id:         Option<String>,
  pub name:       Option<String>,
  #[serde(default)]
  pub categories: Option<Vec<LegacyCategory>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyCategory {
  #[serde(default, deserialize_with = "lenient_id")]
  pub id:    Option<String>,
  #[serde(default)]
  pub name:  String,
  #[serde(default)]
  pub items: Option<Vec<LegacyItem>>,
}

/// An item in whatever shape the legacy category used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LegacyItem(pub Record);

impl LegacyItem {
  pub fn get(&self, field: &str) -> Value {
    self.0.get(field).cloned().unwrap_or(Value::Null)
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn id_from_value(v: &Value) -> Option<String> {
  match v {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let v = Option::<Value>::deserialize(deserializer)?;
  Ok(v.as_ref().and_then(id_from_value))
}

fn number_from_value(v: &Value) -> Option<f64> {
  match v {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// Truthiness as the old app saw it: `true`, non-zero numbers, and
/// non-empty strings other than `"0"`/`"false"` are set.
fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
  D: Deserializer<'de>,
{
  let v = Option::<Value>::deserialize(deserializer)?;
  Ok(v.map(|v| match v {
    Value::Bool(b) => b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !matches!(s.trim(), "" | "0" | "false"),
    Value::Null => false,
    Value::Array(_) | Value::Object(_) => true,
  }))
}

/// Ints, floats and numeric strings; anything else is treated as absent.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let v = Option::<Value>::deserialize(deserializer)?;
  Ok(v.as_ref().and_then(number_from_value))
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  let v = Option::<Value>::deserialize(deserializer)?;
  Ok(
    v.as_ref()
      .and_then(number_from_value)
      .filter(|f| f.is_finite())
      .map(|f| f.round() as i64),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn monster_cha_aliases_car() {
    let m: LegacyMonster =
      serde_json::from_str(r#"{"name":"Goblin","cha":"8"}"#).unwrap();
    assert_eq!(m.field("car"), Some(&Value::from("8")));
    assert_eq!(m.field("name"), Some(&Value::from("Goblin")));
    assert!(m.field("dex").is_none());
    assert!(m.id().is_none());
  }

  #[test]
  fn map_fields_are_camel_case() {
    let m: LegacyMap = serde_json::from_str(
      r#"{"id":17,"name":"Cave","group":"Dungeons","imagePath":"cave.png","keepOpen":true,"panX":3.5}"#,
    )
    .unwrap();
    assert_eq!(m.id.as_deref(), Some("17"));
    assert_eq!(m.group.as_deref(), Some("Dungeons"));
    assert_eq!(m.image_path.as_deref(), Some("cave.png"));
    assert_eq!(m.keep_open, Some(true));
    assert_eq!(m.pan_x, Some(3.5));
    assert!(m.zoom.is_none());
  }

  #[test]
  fn map_view_state_accepts_numbers_and_strings() {
    let maps: Vec<LegacyMap> = parse_snapshot(
      Domain::Maps,
      br#"[
        {"keepOpen":1,"zoom":1,"rotation":"90","originalWidth":800.0},
        {"keepOpen":0,"panX":"not a number","originalHeight":"600"},
        {"keepOpen":null,"panY":-2}
      ]"#,
    )
    .unwrap();
    assert_eq!(maps[0].keep_open, Some(true));
    assert_eq!(maps[0].zoom, Some(1.0));
    assert_eq!(maps[0].rotation, Some(90.0));
    assert_eq!(maps[0].original_width, Some(800));
    assert_eq!(maps[1].keep_open, Some(false));
    assert!(maps[1].pan_x.is_none());
    assert_eq!(maps[1].original_height, Some(600));
    assert_eq!(maps[2].keep_open, None);
    assert_eq!(maps[2].pan_y, Some(-2.0));
  }

  #[test]
  fn shop_with_null_categories_parses() {
    let shops: Vec<LegacyShop> =
      parse_snapshot(Domain::Shops, br#"[{"name":"Empty","categories":null}]"#).unwrap();
    assert_eq!(shops.len(), 1);
    assert!(shops[0].categories.is_none());
  }

  #[test]
  fn non_array_snapshot_is_malformed() {
    let err = parse_snapshot::<LegacyMap>(Domain::Maps, br#"{"maps":[]}"#).unwrap_err();
    assert!(matches!(err, Error::MalformedSnapshot { domain: Domain::Maps, .. }));
  }
}
