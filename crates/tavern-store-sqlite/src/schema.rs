//! SQL schema for the Tavern SQLite store.
//!
//! There is no stored schema version. [`CREATE_TABLES`] is idempotent thanks
//! to `CREATE TABLE IF NOT EXISTS`, and everything an older database may be
//! missing is described by [`COLUMN_ADDITIONS`] and the shape migrations in
//! [`crate::migrate`].

/// Every table of the current data model.
pub const TABLES: &[&str] = &[
  "monsters",
  "spells",
  "maps",
  "shops",
  "categories",
  "items",
  "songs",
  "campaigns",
  "characters",
  "encounters",
  "encounter_monsters",
  "encounter_characters",
  "calendars",
  "diary_entries",
];

/// Tables from the per-type item layout that preceded `items`.
pub const OBSOLETE_TABLES: &[&str] = &["items_weapons", "items_armors"];

/// Columns of `monsters`, in insertion order. Legacy monster records use
/// these keys directly.
pub const MONSTER_COLUMNS: &[&str] = &[
  "id", "name", "vd", "type", "alignment", "origin", "size", "px", "armor", "hp", "speed",
  "str", "dex", "con", "int", "wis", "car", "savingThrows", "skills", "senses", "languages",
  "damageResistances", "damageImmunities", "conditionImmunities", "damageVulnerabilities",
  "traits", "actions", "legendaryActions", "reactions", "description", "image",
];

/// `(table, column, declaration)` for every column added after its table
/// first shipped.
pub const COLUMN_ADDITIONS: &[(&str, &str, &str)] = &[
  ("maps", "song_id", "TEXT"),
  ("maps", "campaign_id", "TEXT"),
  ("maps", "easy_battle_song_id", "TEXT"),
  ("maps", "medium_battle_song_id", "TEXT"),
  ("maps", "hard_battle_song_id", "TEXT"),
  ("maps", "deadly_battle_song_id", "TEXT"),
  ("maps", "extreme_battle_song_id", "TEXT"),
  ("encounters", "easy_battle_song_id", "TEXT"),
  ("encounters", "medium_battle_song_id", "TEXT"),
  ("encounters", "hard_battle_song_id", "TEXT"),
  ("encounters", "deadly_battle_song_id", "TEXT"),
  ("encounters", "extreme_battle_song_id", "TEXT"),
  ("calendars", "current_year", "TEXT"),
  ("characters", "is_player_character", "BOOLEAN DEFAULT 0"),
];

/// Target shape of `categories`: the item layout lives in
/// `columns_definition` (JSON) rather than a fixed `type`.
pub const CATEGORIES_COLUMNS: &[&str] = &["id", "shop_id", "name", "columns_definition"];
pub const CATEGORIES_DEFINITION: &str = "
    id                 TEXT PRIMARY KEY,
    shop_id            TEXT,
    name               TEXT,
    columns_definition TEXT,
    FOREIGN KEY (shop_id) REFERENCES shops (id) ON DELETE CASCADE
";

/// Target shape of `campaigns`: images are raw bytes in `image_data`.
pub const CAMPAIGNS_COLUMNS: &[&str] = &[
  "id", "name", "image_data", "description", "author", "game", "participants", "notes",
];
pub const CAMPAIGNS_DEFINITION: &str = "
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    image_data   BLOB,
    description  TEXT,
    author       TEXT,
    game         TEXT,
    participants TEXT,
    notes        TEXT
";

/// Full table DDL for the current model.
pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS monsters (
    id TEXT PRIMARY KEY,
    name TEXT, vd TEXT, type TEXT, alignment TEXT, origin TEXT, size TEXT, px TEXT,
    armor TEXT, hp TEXT, speed TEXT,
    str TEXT, dex TEXT, con TEXT, int TEXT, wis TEXT, car TEXT,
    savingThrows TEXT, skills TEXT, senses TEXT, languages TEXT,
    damageResistances TEXT, damageImmunities TEXT, conditionImmunities TEXT,
    damageVulnerabilities TEXT,
    traits TEXT, actions TEXT, legendaryActions TEXT, reactions TEXT,
    description TEXT, image TEXT
);

CREATE TABLE IF NOT EXISTS spells (
    id                      TEXT PRIMARY KEY,
    name                    TEXT NOT NULL,
    school                  TEXT,
    level                   INTEGER,
    range                   TEXT,
    duration                TEXT,
    cost                    TEXT,
    is_ritual               BOOLEAN,
    requires_concentration  BOOLEAN,
    has_material_components BOOLEAN,
    components              TEXT,
    classes                 TEXT,
    description             TEXT,
    damage_attack           TEXT,
    aoe                     TEXT,
    saving_throw            TEXT,
    higher_level_casting    TEXT
);

CREATE TABLE IF NOT EXISTS maps (
    id                     TEXT PRIMARY KEY,
    name                   TEXT,
    group_name             TEXT,
    url                    TEXT,
    imagePath              TEXT,
    image_data             BLOB,
    keepOpen               INTEGER,
    zoom                   REAL,
    rotation               REAL,
    panX                   REAL,
    panY                   REAL,
    original_width         INTEGER,
    original_height        INTEGER,
    notes                  TEXT,
    song_id                TEXT,
    campaign_id            TEXT,
    easy_battle_song_id    TEXT,
    medium_battle_song_id  TEXT,
    hard_battle_song_id    TEXT,
    deadly_battle_song_id  TEXT,
    extreme_battle_song_id TEXT,
    FOREIGN KEY (song_id)                REFERENCES songs (id),
    FOREIGN KEY (campaign_id)            REFERENCES campaigns (id),
    FOREIGN KEY (easy_battle_song_id)    REFERENCES songs (id),
    FOREIGN KEY (medium_battle_song_id)  REFERENCES songs (id),
    FOREIGN KEY (hard_battle_song_id)    REFERENCES songs (id),
    FOREIGN KEY (deadly_battle_song_id)  REFERENCES songs (id),
    FOREIGN KEY (extreme_battle_song_id) REFERENCES songs (id)
);

CREATE TABLE IF NOT EXISTS shops (
    id   TEXT PRIMARY KEY,
    name TEXT
);

CREATE TABLE IF NOT EXISTS categories (
    id                 TEXT PRIMARY KEY,
    shop_id            TEXT,
    name               TEXT,
    columns_definition TEXT,
    FOREIGN KEY (shop_id) REFERENCES shops (id) ON DELETE CASCADE
);

-- Item properties are a JSON object keyed by the category's column names.
CREATE TABLE IF NOT EXISTS items (
    id          TEXT PRIMARY KEY,
    category_id TEXT,
    data        TEXT,
    FOREIGN KEY (category_id) REFERENCES categories (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS songs (
    id         TEXT PRIMARY KEY,
    name       TEXT,
    group_name TEXT,
    filePath   TEXT
);

CREATE TABLE IF NOT EXISTS campaigns (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    image_data   BLOB,
    description  TEXT,
    author       TEXT,
    game         TEXT,
    participants TEXT,
    notes        TEXT
);

CREATE TABLE IF NOT EXISTS characters (
    id                             TEXT PRIMARY KEY,
    name                           TEXT NOT NULL,
    class                          TEXT,
    level                          INTEGER,
    background                     TEXT,
    race                           TEXT,
    alignment                      TEXT,
    playerName                     TEXT,
    experiencePoints               INTEGER,
    strength                       INTEGER,
    dexterity                      INTEGER,
    constitution                   INTEGER,
    intelligence                   INTEGER,
    wisdom                         INTEGER,
    charisma                       INTEGER,
    proficiencyBonus               INTEGER,
    armorClass                     INTEGER,
    initiative                     INTEGER,
    speed                          INTEGER,
    maxHitPoints                   INTEGER,
    currentHitPoints               INTEGER,
    temporaryHitPoints             INTEGER,
    hitDice                        TEXT,
    otherProficienciesAndLanguages TEXT,
    equipment                      TEXT,
    featuresAndTraits              TEXT,
    age                            TEXT,
    height                         TEXT,
    weight                         TEXT,
    eyes                           TEXT,
    skin                           TEXT,
    hair                           TEXT,
    image                          BLOB,
    spellcastingAbility            TEXT,
    spellSaveDC                    INTEGER,
    spellAttackBonus               INTEGER,
    campaign_id                    TEXT,
    is_player_character            BOOLEAN DEFAULT 0,
    FOREIGN KEY (campaign_id) REFERENCES campaigns (id)
);

CREATE TABLE IF NOT EXISTS encounters (
    id                     TEXT PRIMARY KEY,
    name                   TEXT NOT NULL,
    campaign_id            TEXT,
    song_id                TEXT,
    easy_battle_song_id    TEXT,
    medium_battle_song_id  TEXT,
    hard_battle_song_id    TEXT,
    deadly_battle_song_id  TEXT,
    extreme_battle_song_id TEXT,
    FOREIGN KEY (campaign_id)            REFERENCES campaigns (id) ON DELETE SET NULL,
    FOREIGN KEY (song_id)                REFERENCES songs (id) ON DELETE SET NULL,
    FOREIGN KEY (easy_battle_song_id)    REFERENCES songs (id),
    FOREIGN KEY (medium_battle_song_id)  REFERENCES songs (id),
    FOREIGN KEY (hard_battle_song_id)    REFERENCES songs (id),
    FOREIGN KEY (deadly_battle_song_id)  REFERENCES songs (id),
    FOREIGN KEY (extreme_battle_song_id) REFERENCES songs (id)
);

CREATE TABLE IF NOT EXISTS encounter_monsters (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    encounter_id TEXT NOT NULL,
    monster_id   TEXT NOT NULL,
    FOREIGN KEY (encounter_id) REFERENCES encounters (id) ON DELETE CASCADE,
    FOREIGN KEY (monster_id)   REFERENCES monsters (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS encounter_characters (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    encounter_id TEXT NOT NULL,
    character_id TEXT NOT NULL,
    FOREIGN KEY (encounter_id) REFERENCES encounters (id) ON DELETE CASCADE,
    FOREIGN KEY (character_id) REFERENCES characters (id) ON DELETE CASCADE
);

-- One calendar per campaign; name lists are JSON arrays.
CREATE TABLE IF NOT EXISTS calendars (
    id            TEXT PRIMARY KEY,
    campaign_id   TEXT NOT NULL UNIQUE,
    num_months    INTEGER NOT NULL,
    month_names   TEXT NOT NULL,
    days_in_month TEXT NOT NULL,
    days_in_week  INTEGER NOT NULL,
    weekday_names TEXT NOT NULL,
    current_year  TEXT,
    FOREIGN KEY (campaign_id) REFERENCES campaigns (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS diary_entries (
    id          TEXT PRIMARY KEY,
    campaign_id TEXT NOT NULL,
    year        TEXT NOT NULL,
    month_index INTEGER NOT NULL,
    day         INTEGER NOT NULL,
    content     TEXT,
    created_at  DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at  DATETIME DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (campaign_id, year, month_index, day),
    FOREIGN KEY (campaign_id) REFERENCES campaigns (id) ON DELETE CASCADE
);
";
