//! Shop category classification and the column layouts it implies.
//!
//! Categories in legacy snapshots carried no layout of their own; the layout
//! is inferred from the category's display name. The same inference turns
//! the old `categories.type` column into a `columns_definition`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::legacy::LegacyItem;

/// One column of a category's item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
  pub name: String,
  #[serde(rename = "type")]
  pub kind: String,
}

/// `(column name, legacy item field)` pairs, in display order.
type Layout = &'static [(&'static str, &'static str)];

const WEAPON_LAYOUT: Layout = &[
  ("Nombre", "name"),
  ("Tipo", "type"),
  ("Precio", "price"),
  ("Daño", "damage"),
  ("Peso", "weight"),
  ("Propiedades", "properties"),
  ("Origen", "origin"),
];

const ARMOR_LAYOUT: Layout = &[
  ("Nombre", "name"),
  ("Tipo", "type"),
  ("Precio", "price"),
  ("Tipo de armadura", "type"),
  ("Clase de Armadura (CA)", "armorClass"),
  ("Fuerza", "strength"),
  ("Sigilo", "stealth"),
  ("Origen", "origin"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
  Weapons,
  Armor,
  /// No known layout; items are stored as-is.
  Other,
}

impl CategoryKind {
  /// Case-insensitive substring match. Weapons win over armor when a name
  /// mentions both.
  pub fn classify(name: &str) -> Self {
    let name = name.to_lowercase();
    if name.contains("armas") || name.contains("weapon") {
      CategoryKind::Weapons
    } else if name.contains("armadura") || name.contains("armor") || name.contains("armour") {
      CategoryKind::Armor
    } else {
      CategoryKind::Other
    }
  }

  fn layout(self) -> Layout {
    match self {
      CategoryKind::Weapons => WEAPON_LAYOUT,
      CategoryKind::Armor => ARMOR_LAYOUT,
      CategoryKind::Other => &[],
    }
  }

  pub fn columns(self) -> Vec<ColumnDef> {
    self
      .layout()
      .iter()
      .map(|(name, _)| ColumnDef { name: (*name).to_owned(), kind: "text".to_owned() })
      .collect()
  }

  /// JSON text stored in `categories.columns_definition`.
  pub fn columns_definition(self) -> String {
    serde_json::to_string(&self.columns()).unwrap_or_else(|_| "[]".to_owned())
  }

  /// Translate a legacy item into the object stored in `items.data`.
  ///
  /// Known layouts produce exactly their column keys (missing legacy fields
  /// become `null`); [`CategoryKind::Other`] passes the record through.
  pub fn item_data(self, item: &LegacyItem) -> Value {
    match self {
      CategoryKind::Other => Value::Object(item.0.clone()),
      kind => Value::Object(
        kind
          .layout()
          .iter()
          .map(|(column, field)| ((*column).to_owned(), item.get(field)))
          .collect::<Map<_, _>>(),
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn item(v: Value) -> LegacyItem { serde_json::from_value(v).unwrap() }

  #[test]
  fn classifies_by_substring_case_insensitively() {
    assert_eq!(CategoryKind::classify("Armas Cuerpo a Cuerpo"), CategoryKind::Weapons);
    assert_eq!(CategoryKind::classify("ARMADURAS ligeras"), CategoryKind::Armor);
    assert_eq!(CategoryKind::classify("Heavy Armor"), CategoryKind::Armor);
    assert_eq!(CategoryKind::classify("Ranged Weapons"), CategoryKind::Weapons);
    assert_eq!(CategoryKind::classify("Pociones"), CategoryKind::Other);
  }

  #[test]
  fn weapon_columns_in_order() {
    let names: Vec<String> =
      CategoryKind::Weapons.columns().into_iter().map(|c| c.name).collect();
    assert_eq!(
      names,
      ["Nombre", "Tipo", "Precio", "Daño", "Peso", "Propiedades", "Origen"]
    );
  }

  #[test]
  fn other_has_empty_definition() {
    assert_eq!(CategoryKind::Other.columns_definition(), "[]");
  }

  #[test]
  fn armor_item_maps_legacy_fields() {
    let data = CategoryKind::Armor.item_data(&item(json!({
      "name": "Cota de malla",
      "type": "Pesada",
      "price": "75 po",
      "armorClass": "16",
      "strength": "Fue 13",
      "stealth": "Desventaja",
    })));
    assert_eq!(data["Nombre"], "Cota de malla");
    assert_eq!(data["Tipo de armadura"], "Pesada");
    assert_eq!(data["Clase de Armadura (CA)"], "16");
    assert_eq!(data["Origen"], Value::Null);
    assert_eq!(data.as_object().unwrap().len(), 8);
  }

  #[test]
  fn other_item_passes_through() {
    let raw = json!({ "name": "Poción de curación", "price": "50 po", "rarity": "común" });
    assert_eq!(CategoryKind::Other.item_data(&item(raw.clone())), raw);
  }
}
