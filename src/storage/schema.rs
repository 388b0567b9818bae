//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Roster-Harvest
//! database.

use crate::storage::traits::{StorageError, StorageResult};
use rusqlite::Connection;

/// Version stamped into `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track pipeline runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per (entity_id, source_group)
CREATE TABLE IF NOT EXISTS members (
    internal_id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id INTEGER NOT NULL,
    username TEXT,
    first_name TEXT,
    last_name TEXT,
    phone TEXT,
    is_premium INTEGER NOT NULL DEFAULT 0,
    source_group TEXT NOT NULL,
    scraped_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_online INTEGER,
    UNIQUE(entity_id, source_group)
);

CREATE INDEX IF NOT EXISTS idx_members_group ON members(source_group);
"#;

/// Initializes the database schema
///
/// Creating the tables is idempotent. A database stamped with a newer schema
/// version than this build understands is refused.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let found: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(StorageError::SchemaVersion {
            found,
            expected: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(SCHEMA_SQL)?;

    if found < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }

    Ok(())
}
