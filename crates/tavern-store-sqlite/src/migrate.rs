//! Idempotent forward migrations.
//!
//! Nothing records which migrations have run. Each step inspects the live
//! schema and only acts when the database is still in the old shape, so the
//! whole sequence is safe to run on every startup.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension as _, params_from_iter, types::Value};
use serde::Serialize;
use tavern_core::category::CategoryKind;
use tracing::{debug, info};

use crate::{
  Error, Result, encode,
  schema::{
    CAMPAIGNS_COLUMNS, CAMPAIGNS_DEFINITION, CATEGORIES_COLUMNS, CATEGORIES_DEFINITION,
    COLUMN_ADDITIONS, CREATE_TABLES, OBSOLETE_TABLES,
  },
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// A migration step that changed the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MigrationStep {
  DroppedTable { table: String },
  AddedColumn { table: String, column: String },
  ReshapedTable { table: String, rows: i64 },
}

/// Everything [`run_migrations`] changed. Empty on an up-to-date database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
  pub steps: Vec<MigrationStep>,
}

impl MigrationReport {
  pub fn is_noop(&self) -> bool { self.steps.is_empty() }
}

// ─── Inspection ──────────────────────────────────────────────────────────────

/// Reject anything but a plain SQL identifier; names are spliced into DDL.
pub fn check_identifier(name: &str) -> Result<()> {
  let mut chars = name.chars();
  let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
  if valid { Ok(()) } else { Err(Error::InvalidIdentifier(name.to_owned())) }
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Whether `table` currently has a column named `column`. A missing table
/// has no columns.
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Column names of `table` in declaration order.
pub fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
  let names = stmt
    .query_map([table], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
  check_identifier(table)?;
  Ok(conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))?)
}

fn foreign_key_violations(conn: &Connection) -> Result<i64> {
  Ok(conn.query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |row| row.get(0))?)
}

// ─── Additive steps ──────────────────────────────────────────────────────────

/// Create every table of the current model that does not exist yet.
pub fn ensure_tables_exist(conn: &mut Connection) -> Result<()> {
  let tx = conn.transaction()?;
  tx.execute_batch(CREATE_TABLES)?;
  tx.commit()?;
  Ok(())
}

/// `ALTER TABLE … ADD COLUMN` unless the column is already there. Returns
/// whether the table was altered.
pub fn add_column_if_missing(
  conn:   &Connection,
  table:  &str,
  column: &str,
  decl:   &str,
) -> Result<bool> {
  check_identifier(table)?;
  check_identifier(column)?;
  if column_exists(conn, table, column)? {
    debug!(table, column, "column already present");
    return Ok(false);
  }
  conn.execute_batch(&format!("ALTER TABLE \"{table}\" ADD COLUMN \"{column}\" {decl};"))?;
  info!(table, column, "added column");
  Ok(true)
}

pub fn drop_table_if_exists(conn: &Connection, table: &str) -> Result<bool> {
  check_identifier(table)?;
  if !table_exists(conn, table)? {
    return Ok(false);
  }
  conn.execute_batch(&format!("DROP TABLE \"{table}\";"))?;
  info!(table, "dropped obsolete table");
  Ok(true)
}

// ─── Shape migrations ────────────────────────────────────────────────────────

/// Target layout of a table: the column order the transform produces and the
/// body of its `CREATE TABLE` statement.
#[derive(Debug, Clone, Copy)]
pub struct TableShape<'a> {
  pub columns:    &'a [&'a str],
  pub definition: &'a str,
}

/// One row of the table being reshaped, addressable by old column name.
#[derive(Debug, Clone, Default)]
pub struct OldRow {
  values: HashMap<String, Value>,
}

impl OldRow {
  /// Value of `column`, or NULL if the old table had no such column.
  pub fn get(&self, column: &str) -> Value {
    self.values.get(column).cloned().unwrap_or(Value::Null)
  }

  pub fn text(&self, column: &str) -> Option<String> {
    match self.values.get(column) {
      Some(Value::Text(s)) => Some(s.clone()),
      Some(Value::Integer(i)) => Some(i.to_string()),
      Some(Value::Real(r)) => Some(r.to_string()),
      _ => None,
    }
  }
}

/// Rebuild `table` in the layout described by `shape` if it still has
/// `old_column`.
///
/// Rows are copied through `transform` into `<table>__shadow`; once the
/// shadow holds as many rows as the original, the original is dropped and the
/// shadow renamed into its place. All of it happens in one transaction, so a
/// failure at any point leaves the original table untouched. Foreign-key
/// enforcement is suspended for the swap and restored afterwards.
///
/// Every column of the old table must either appear in `shape` or be
/// `old_column`; anything else would be silently dropped, so it is an error.
///
/// Returns the number of rows carried over, or `None` if the table was
/// already in its new shape.
pub fn migrate_table_shape<F>(
  conn:       &mut Connection,
  table:      &str,
  old_column: &str,
  shape:      &TableShape<'_>,
  transform:  F,
) -> Result<Option<i64>>
where
  F: FnMut(&OldRow) -> Result<Vec<Value>>,
{
  check_identifier(table)?;
  for column in shape.columns {
    check_identifier(column)?;
  }
  if !column_exists(conn, table, old_column)? {
    debug!(table, old_column, "table already in current shape");
    return Ok(None);
  }

  let unmapped: Vec<String> = column_names(conn, table)?
    .into_iter()
    .filter(|c| c != old_column && !shape.columns.contains(&c.as_str()))
    .collect();
  if !unmapped.is_empty() {
    return Err(Error::UnmappedColumns { table: table.to_owned(), columns: unmapped });
  }

  // Must be toggled outside a transaction; dropping a parent table with
  // enforcement on would cascade into its children.
  let fk_enabled: bool = conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
  conn.pragma_update(None, "foreign_keys", false)?;
  let swapped = swap_table(conn, table, shape, transform);
  conn.pragma_update(None, "foreign_keys", fk_enabled)?;

  let rows = swapped?;
  info!(table, old_column, rows, "reshaped table");
  Ok(Some(rows))
}

fn swap_table<F>(
  conn:          &mut Connection,
  table:         &str,
  shape:         &TableShape<'_>,
  mut transform: F,
) -> Result<i64>
where
  F: FnMut(&OldRow) -> Result<Vec<Value>>,
{
  let shadow = format!("{table}__shadow");
  let tx = conn.transaction()?;
  let violations_before = foreign_key_violations(&tx)?;

  tx.execute_batch(&format!(
    "DROP TABLE IF EXISTS \"{shadow}\";
     CREATE TABLE \"{shadow}\" ({});",
    shape.definition
  ))?;

  let column_list = shape
    .columns
    .iter()
    .map(|c| format!("\"{c}\""))
    .collect::<Vec<_>>()
    .join(", ");
  let placeholders = (1..=shape.columns.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");

  {
    let mut select = tx.prepare(&format!("SELECT * FROM \"{table}\""))?;
    let names: Vec<String> = select.column_names().into_iter().map(str::to_owned).collect();
    let mut insert =
      tx.prepare(&format!("INSERT INTO \"{shadow}\" ({column_list}) VALUES ({placeholders})"))?;

    let mut rows = select.query([])?;
    while let Some(row) = rows.next()? {
      let mut values = HashMap::with_capacity(names.len());
      for (i, name) in names.iter().enumerate() {
        values.insert(name.clone(), row.get::<_, Value>(i)?);
      }
      let reshaped = transform(&OldRow { values })?;
      insert.execute(params_from_iter(reshaped))?;
    }
  }

  let expected = count_rows(&tx, table)?;
  let actual = count_rows(&tx, &shadow)?;
  if expected != actual {
    return Err(Error::RowCountMismatch { table: table.to_owned(), expected, actual });
  }

  tx.execute_batch(&format!(
    "DROP TABLE \"{table}\";
     ALTER TABLE \"{shadow}\" RENAME TO \"{table}\";"
  ))?;

  let violations_after = foreign_key_violations(&tx)?;
  if violations_after > violations_before {
    return Err(Error::ForeignKeyViolation {
      table:  table.to_owned(),
      before: violations_before,
      after:  violations_after,
    });
  }

  tx.commit()?;
  Ok(actual)
}

// ─── Runner ──────────────────────────────────────────────────────────────────

/// Bring `conn` up to the current schema. Any error here is fatal: the
/// caller must not serve requests against a partially migrated database.
pub fn run_migrations(conn: &mut Connection) -> Result<MigrationReport> {
  let mut report = MigrationReport::default();

  for table in OBSOLETE_TABLES {
    if drop_table_if_exists(conn, table)? {
      report.steps.push(MigrationStep::DroppedTable { table: (*table).to_owned() });
    }
  }

  ensure_tables_exist(conn)?;

  for additions in COLUMN_ADDITIONS.chunk_by(|a, b| a.0 == b.0) {
    let tx = conn.transaction()?;
    for (table, column, decl) in additions {
      if add_column_if_missing(&tx, table, column, decl)? {
        report.steps.push(MigrationStep::AddedColumn {
          table:  (*table).to_owned(),
          column: (*column).to_owned(),
        });
      }
    }
    tx.commit()?;
  }

  migrate_categories(conn, &mut report)?;
  migrate_campaigns(conn, &mut report)?;

  conn.pragma_update(None, "foreign_keys", true)?;

  if report.is_noop() {
    info!("schema up to date");
  } else {
    info!(steps = report.steps.len(), "schema migrated");
  }
  Ok(report)
}

/// `categories.type` gave way to a JSON `columns_definition`; the old type
/// is classified the same way legacy category names are.
fn migrate_categories(conn: &mut Connection, report: &mut MigrationReport) -> Result<()> {
  if column_exists(conn, "categories", "columns_definition")? {
    return Ok(());
  }

  let shape = TableShape { columns: CATEGORIES_COLUMNS, definition: CATEGORIES_DEFINITION };
  let reshaped = migrate_table_shape(conn, "categories", "type", &shape, |row| {
    let kind = row
      .text("type")
      .map(|t| CategoryKind::classify(&t))
      .unwrap_or(CategoryKind::Other);
    Ok(vec![
      row.get("id"),
      row.get("shop_id"),
      row.get("name"),
      Value::Text(kind.columns_definition()),
    ])
  })?;

  match reshaped {
    Some(rows) => {
      report.steps.push(MigrationStep::ReshapedTable { table: "categories".into(), rows });
    }
    None => {
      if add_column_if_missing(conn, "categories", "columns_definition", "TEXT")? {
        report.steps.push(MigrationStep::AddedColumn {
          table:  "categories".into(),
          column: "columns_definition".into(),
        });
      }
    }
  }
  Ok(())
}

/// Campaign images moved from `image` to a BLOB `image_data`.
fn migrate_campaigns(conn: &mut Connection, report: &mut MigrationReport) -> Result<()> {
  let shape = TableShape { columns: CAMPAIGNS_COLUMNS, definition: CAMPAIGNS_DEFINITION };
  let reshaped = migrate_table_shape(conn, "campaigns", "image", &shape, |row| {
    let image = match row.get("image_data") {
      Value::Null => encode::image_bytes(row.get("image")),
      current => current,
    };
    Ok(vec![
      row.get("id"),
      row.get("name"),
      image,
      row.get("description"),
      row.get("author"),
      row.get("game"),
      row.get("participants"),
      row.get("notes"),
    ])
  })?;

  if let Some(rows) = reshaped {
    report.steps.push(MigrationStep::ReshapedTable { table: "campaigns".into(), rows });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use rusqlite::params;

  use super::*;

  fn conn() -> Connection { Connection::open_in_memory().expect("in-memory db") }

  #[test]
  fn identifiers_are_validated() {
    assert!(check_identifier("maps").is_ok());
    assert!(check_identifier("_shadow2").is_ok());
    assert!(check_identifier("2maps").is_err());
    assert!(check_identifier("maps; DROP TABLE x").is_err());
    assert!(check_identifier("").is_err());
  }

  #[test]
  fn column_exists_reflects_live_schema() {
    let c = conn();
    c.execute_batch("CREATE TABLE t (a TEXT, b INTEGER);").unwrap();
    assert!(column_exists(&c, "t", "a").unwrap());
    assert!(!column_exists(&c, "t", "z").unwrap());
    assert!(!column_exists(&c, "missing", "a").unwrap());
  }

  #[test]
  fn add_column_is_idempotent() {
    let c = conn();
    c.execute_batch("CREATE TABLE t (a TEXT);").unwrap();
    assert!(add_column_if_missing(&c, "t", "b", "TEXT").unwrap());
    assert!(!add_column_if_missing(&c, "t", "b", "TEXT").unwrap());
    assert_eq!(column_names(&c, "t").unwrap(), ["a", "b"]);
  }

  #[test]
  fn ensure_tables_creates_full_schema() {
    let mut c = conn();
    ensure_tables_exist(&mut c).unwrap();
    ensure_tables_exist(&mut c).unwrap();
    for table in crate::schema::TABLES {
      assert!(table_exists(&c, table).unwrap(), "{table} missing");
    }
  }

  #[test]
  fn shape_migration_preserves_rows() {
    let mut c = conn();
    c.execute_batch(
      "CREATE TABLE t (id TEXT PRIMARY KEY, label TEXT, legacy TEXT);
       INSERT INTO t VALUES ('a', 'one', 'x'), ('b', 'two', 'y'), ('c', 'three', NULL);",
    )
    .unwrap();

    let shape = TableShape {
      columns:    &["id", "label", "derived"],
      definition: "id TEXT PRIMARY KEY, label TEXT, derived TEXT",
    };
    let rows = migrate_table_shape(&mut c, "t", "legacy", &shape, |row| {
      let derived = row.text("legacy").map(|s| s.to_uppercase());
      Ok(vec![row.get("id"), row.get("label"), derived.map_or(Value::Null, Value::Text)])
    })
    .unwrap();

    assert_eq!(rows, Some(3));
    assert_eq!(column_names(&c, "t").unwrap(), ["id", "label", "derived"]);
    let derived: Option<String> = c
      .query_row("SELECT derived FROM t WHERE id = 'b'", [], |r| r.get(0))
      .unwrap();
    assert_eq!(derived.as_deref(), Some("Y"));
    assert!(!table_exists(&c, "t__shadow").unwrap());
  }

  #[test]
  fn shape_migration_is_noop_once_applied() {
    let mut c = conn();
    c.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY, fresh TEXT);").unwrap();
    let shape = TableShape { columns: &["id"], definition: "id TEXT PRIMARY KEY" };
    let rows = migrate_table_shape(&mut c, "t", "legacy", &shape, |_| {
      panic!("transform must not run")
    })
    .unwrap();
    assert_eq!(rows, None);
  }

  #[test]
  fn failing_transform_leaves_original_intact() {
    let mut c = conn();
    c.execute_batch(
      "CREATE TABLE t (id TEXT PRIMARY KEY, legacy TEXT);
       INSERT INTO t VALUES ('a', 'keep'), ('b', 'boom');",
    )
    .unwrap();

    let shape = TableShape { columns: &["id"], definition: "id TEXT PRIMARY KEY" };
    let result = migrate_table_shape(&mut c, "t", "legacy", &shape, |row| {
      if row.text("legacy").as_deref() == Some("boom") {
        return Err(Error::InvalidIdentifier("boom".into()));
      }
      Ok(vec![row.get("id")])
    });

    assert!(result.is_err());
    assert_eq!(column_names(&c, "t").unwrap(), ["id", "legacy"]);
    assert_eq!(count_rows(&c, "t").unwrap(), 2);
    assert!(!table_exists(&c, "t__shadow").unwrap());
  }

  #[test]
  fn shape_migration_refuses_to_drop_unlisted_columns() {
    let mut c = conn();
    c.execute_batch(
      "CREATE TABLE t (id TEXT PRIMARY KEY, legacy TEXT, extra TEXT);
       INSERT INTO t VALUES ('a', 'x', 'keep me');",
    )
    .unwrap();
    let shape = TableShape { columns: &["id"], definition: "id TEXT PRIMARY KEY" };

    let err = migrate_table_shape(&mut c, "t", "legacy", &shape, |row| Ok(vec![row.get("id")]))
      .unwrap_err();

    assert!(
      matches!(&err, Error::UnmappedColumns { columns, .. } if columns == &["extra".to_owned()]),
      "{err}"
    );
    assert_eq!(column_names(&c, "t").unwrap(), ["id", "legacy", "extra"]);
  }

  #[test]
  fn shape_migration_restores_foreign_key_setting() {
    let mut c = conn();
    c.pragma_update(None, "foreign_keys", true).unwrap();
    c.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY, legacy TEXT);").unwrap();
    let shape = TableShape { columns: &["id"], definition: "id TEXT PRIMARY KEY" };
    migrate_table_shape(&mut c, "t", "legacy", &shape, |row| Ok(vec![row.get("id")])).unwrap();
    let fk: bool = c.pragma_query_value(None, "foreign_keys", |r| r.get(0)).unwrap();
    assert!(fk);
  }

  #[test]
  fn reshaping_parent_keeps_children() {
    let mut c = conn();
    c.pragma_update(None, "foreign_keys", true).unwrap();
    c.execute_batch(
      "CREATE TABLE parent (id TEXT PRIMARY KEY, legacy TEXT);
       CREATE TABLE child (
         id TEXT PRIMARY KEY,
         parent_id TEXT REFERENCES parent (id) ON DELETE CASCADE
       );
       INSERT INTO parent VALUES ('p1', 'x');
       INSERT INTO child VALUES ('c1', 'p1'), ('c2', 'p1');",
    )
    .unwrap();

    let shape = TableShape { columns: &["id"], definition: "id TEXT PRIMARY KEY" };
    migrate_table_shape(&mut c, "parent", "legacy", &shape, |row| Ok(vec![row.get("id")]))
      .unwrap();

    assert_eq!(count_rows(&c, "child").unwrap(), 2);
    // The renamed table is still the target of the child's foreign key.
    c.execute("DELETE FROM parent WHERE id = ?1", params!["p1"]).unwrap();
    assert_eq!(count_rows(&c, "child").unwrap(), 0);
  }
}
