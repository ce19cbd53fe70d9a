//! One-time import of legacy JSON snapshots into their relational tables.
//!
//! A domain is imported only when its destination table is empty and its
//! snapshot file exists. Once rows are present the import switches itself
//! off. Each domain is written in a single transaction; a failure in one
//! domain leaves that table empty and does not affect the others.

use std::{collections::BTreeMap, fs, path::Path};

use rusqlite::{Connection, Transaction, params, params_from_iter};
use serde::{Serialize, de::DeserializeOwned};
use tavern_core::{
  category::CategoryKind,
  domain::{Domain, LegacyPaths},
  id::generate_backend_id,
  legacy::{self, LegacyMap, LegacyMonster, LegacyShop},
};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  encode::{MapRow, monster_values},
  migrate::count_rows,
  schema::MONSTER_COLUMNS,
};

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
  Imported { records: usize },
  SkippedNotEmpty { existing: i64 },
  SkippedMissingFile,
  /// The domain's transaction was rolled back; its table is still empty.
  Failed { error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImportReport {
  pub domains: BTreeMap<Domain, ImportOutcome>,
}

impl ImportReport {
  pub fn get(&self, domain: Domain) -> Option<&ImportOutcome> { self.domains.get(&domain) }

  /// Top-level records imported for `domain` (zero unless it was imported).
  pub fn imported(&self, domain: Domain) -> usize {
    match self.get(domain) {
      Some(ImportOutcome::Imported { records }) => *records,
      _ => 0,
    }
  }

  pub fn failures(&self) -> impl Iterator<Item = (Domain, &str)> {
    self.domains.iter().filter_map(|(domain, outcome)| match outcome {
      ImportOutcome::Failed { error } => Some((*domain, error.as_str())),
      _ => None,
    })
  }
}

// ─── Row mapping ─────────────────────────────────────────────────────────────

/// Translates one legacy record into rows of its domain's table(s).
pub trait RowMapper {
  type Record: DeserializeOwned;

  const DOMAIN: Domain;

  /// Insert `record` (and any nested children) inside `tx`.
  fn insert(&mut self, tx: &Transaction<'_>, record: Self::Record) -> Result<()>;
}

/// Monsters keep their legacy id when they have one.
pub struct MonsterMapper {
  sql: String,
}

impl Default for MonsterMapper {
  fn default() -> Self {
    let columns = MONSTER_COLUMNS
      .iter()
      .map(|c| format!("\"{c}\""))
      .collect::<Vec<_>>()
      .join(", ");
    let placeholders = (1..=MONSTER_COLUMNS.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    Self { sql: format!("INSERT INTO monsters ({columns}) VALUES ({placeholders})") }
  }
}

impl RowMapper for MonsterMapper {
  type Record = LegacyMonster;

  const DOMAIN: Domain = Domain::Monsters;

  fn insert(&mut self, tx: &Transaction<'_>, monster: LegacyMonster) -> Result<()> {
    let id = monster
      .id()
      .unwrap_or_else(|| generate_backend_id(Self::DOMAIN.id_prefix()));
    tx.prepare_cached(&self.sql)?
      .execute(params_from_iter(monster_values(&monster, &id)))?;
    Ok(())
  }
}

/// Maps keep their legacy id; `group` becomes `group_name` and missing view
/// state gets its defaults.
#[derive(Default)]
pub struct MapMapper;

impl RowMapper for MapMapper {
  type Record = LegacyMap;

  const DOMAIN: Domain = Domain::Maps;

  fn insert(&mut self, tx: &Transaction<'_>, map: LegacyMap) -> Result<()> {
    let id = map
      .id
      .clone()
      .unwrap_or_else(|| generate_backend_id(Self::DOMAIN.id_prefix()));
    let row = MapRow::from_legacy(map, id)?;

    tx.prepare_cached(
      "INSERT INTO maps (
         id, name, group_name, url, imagePath, image_data, keepOpen,
         zoom, rotation, panX, panY, original_width, original_height, notes
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )?
    .execute(params![
      row.id,
      row.name,
      row.group_name,
      row.url,
      row.image_path,
      row.image_data,
      row.keep_open,
      row.zoom,
      row.rotation,
      row.pan_x,
      row.pan_y,
      row.original_width,
      row.original_height,
      row.notes,
    ])?;
    Ok(())
  }
}

/// Shops, their categories, and their items all receive fresh ids. Items
/// are linked to the new category id; legacy ids are never written.
#[derive(Default)]
pub struct ShopMapper;

impl RowMapper for ShopMapper {
  type Record = LegacyShop;

  const DOMAIN: Domain = Domain::Shops;

  fn insert(&mut self, tx: &Transaction<'_>, shop: LegacyShop) -> Result<()> {
    let shop_id = generate_backend_id(Self::DOMAIN.id_prefix());
    tx.prepare_cached("INSERT INTO shops (id, name) VALUES (?1, ?2)")?
      .execute(params![shop_id, shop.name])?;

    for category in shop.categories.unwrap_or_default() {
      let category_id = generate_backend_id("category");
      let kind = CategoryKind::classify(&category.name);
      tx.prepare_cached(
        "INSERT INTO categories (id, shop_id, name, columns_definition)
         VALUES (?1, ?2, ?3, ?4)",
      )?
      .execute(params![category_id, shop_id, category.name, kind.columns_definition()])?;

      let items = category.items.unwrap_or_default();
      for item in &items {
        let data = serde_json::to_string(&kind.item_data(item))?;
        tx.prepare_cached("INSERT INTO items (id, category_id, data) VALUES (?1, ?2, ?3)")?
          .execute(params![generate_backend_id("item"), category_id, data])?;
      }
      debug!(
        legacy_id = category.id.as_deref().unwrap_or("-"),
        %category_id,
        ?kind,
        items = items.len(),
        "imported category"
      );
    }
    Ok(())
  }
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Import the snapshot at `path` through `mapper` if the domain's table has
/// no rows.
pub fn import_if_empty<M: RowMapper>(
  conn:       &mut Connection,
  path:       &Path,
  mut mapper: M,
) -> Result<ImportOutcome> {
  let domain = M::DOMAIN;
  let existing = count_rows(conn, domain.table())?;
  if existing != 0 {
    debug!(%domain, existing, "table already populated; skipping legacy import");
    return Ok(ImportOutcome::SkippedNotEmpty { existing });
  }

  let bytes = match fs::read(path) {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      debug!(%domain, path = %path.display(), "no legacy snapshot");
      return Ok(ImportOutcome::SkippedMissingFile);
    }
    Err(source) => return Err(Error::Io { path: path.to_owned(), source }),
  };
  let records: Vec<M::Record> = legacy::parse_snapshot(domain, &bytes)?;
  let count = records.len();

  let tx = conn.transaction()?;
  for record in records {
    mapper.insert(&tx, record)?;
  }
  tx.commit()?;

  info!(%domain, records = count, path = %path.display(), "imported legacy snapshot");
  Ok(ImportOutcome::Imported { records: count })
}

/// Run the import for every domain. Failures are confined to their domain
/// and reported rather than returned.
pub fn import_legacy(conn: &mut Connection, paths: &LegacyPaths) -> ImportReport {
  let mut report = ImportReport::default();

  for domain in Domain::ALL {
    let path = paths.get(domain);
    let result = match domain {
      Domain::Monsters => import_if_empty(conn, path, MonsterMapper::default()),
      Domain::Maps => import_if_empty(conn, path, MapMapper),
      Domain::Shops => import_if_empty(conn, path, ShopMapper),
    };
    let outcome = result.unwrap_or_else(|e| {
      warn!(%domain, error = %e, "legacy import failed; table left empty");
      ImportOutcome::Failed { error: e.to_string() }
    });
    report.domains.insert(domain, outcome);
  }

  report
}
