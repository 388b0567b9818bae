//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the MemberStore trait.
//!
//! The store holds two connections to the same WAL-mode database: a writer
//! behind a mutex that serializes every upsert, and a query-only reader used
//! for counts and snapshots. WAL lets the reader see the last committed state
//! without waiting for the writer.

use crate::model::{DisplayName, MemberRecord, StoredRow};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{MemberStore, StorageError, StorageResult, UpsertOutcome};
use crate::storage::{RunRecord, RunStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MEMBER_COLUMNS: &str = "internal_id, entity_id, username, first_name, last_name, phone,
     is_premium, source_group, scraped_at, updated_at, last_online";

/// SQLite storage backend
pub struct SqliteStorage {
    path: PathBuf,
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the store at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Store is open and the schema is in place
    /// * `Err(StorageError::Unavailable)` - The file could not be created,
    ///   opened, or initialized (permissions, corruption, full disk)
    pub fn open(path: &Path) -> StorageResult<Self> {
        let unavailable = |e: StorageError| StorageError::Unavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let writer = Self::open_writer(path).map_err(unavailable)?;
        let reader = Self::open_reader(path).map_err(unavailable)?;

        tracing::debug!("Opened member store at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }

    fn open_writer(path: &Path) -> StorageResult<Connection> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        // journal_mode returns a row, so it cannot go through execute_batch
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute_batch(
            "
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(conn)
    }

    fn open_reader(path: &Path) -> StorageResult<Connection> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA query_only = ON;")?;
        Ok(conn)
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.writer.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn reader(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.reader.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl MemberStore for SqliteStorage {
    // ===== Members =====

    fn upsert(&self, record: &MemberRecord) -> StorageResult<UpsertOutcome> {
        let mut conn = self.writer()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = format_timestamp(Utc::now());
        let (entity_id, source_group) = record.key();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT internal_id FROM members WHERE entity_id = ?1 AND source_group = ?2",
                params![entity_id, source_group],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            Some(internal_id) => {
                tx.execute(
                    "UPDATE members SET username = ?1, first_name = ?2, last_name = ?3,
                     phone = ?4, is_premium = ?5, last_online = ?6, updated_at = ?7
                     WHERE internal_id = ?8",
                    params![
                        record.handle,
                        record.display_name.first,
                        record.display_name.last,
                        record.contact,
                        record.is_premium,
                        record.last_seen,
                        now,
                        internal_id
                    ],
                )?;
                UpsertOutcome::Updated(internal_id)
            }
            None => {
                tx.execute(
                    "INSERT INTO members (entity_id, username, first_name, last_name, phone,
                     is_premium, source_group, scraped_at, updated_at, last_online)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9)",
                    params![
                        record.entity_id,
                        record.handle,
                        record.display_name.first,
                        record.display_name.last,
                        record.contact,
                        record.is_premium,
                        record.source_group,
                        now,
                        record.last_seen
                    ],
                )?;
                UpsertOutcome::Inserted(tx.last_insert_rowid())
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn count(&self) -> StorageResult<u64> {
        let conn = self.reader()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn snapshot(&self) -> StorageResult<Vec<StoredRow>> {
        let mut conn = self.reader()?;

        // One read transaction pins a single WAL snapshot for the whole scan
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let rows = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM members ORDER BY internal_id",
                MEMBER_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], row_to_stored)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        tx.commit()?;

        Ok(rows)
    }

    fn get(&self, entity_id: i64, source_group: &str) -> StorageResult<Option<StoredRow>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM members WHERE entity_id = ?1 AND source_group = ?2",
            MEMBER_COLUMNS
        ))?;

        let row = stmt
            .query_row(params![entity_id, source_group], row_to_stored)
            .optional()?;

        Ok(row)
    }

    // ===== Statistics =====

    fn count_by_group(&self) -> StorageResult<Vec<(String, u64)>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare(
            "SELECT source_group, COUNT(*) FROM members GROUP BY source_group ORDER BY source_group",
        )?;

        let groups = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(groups)
    }

    fn count_premium(&self) -> StorageResult<u64> {
        let conn = self.reader()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM members WHERE is_premium = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(&self, config_hash: &str) -> StorageResult<i64> {
        let conn = self.writer()?;
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![
                format_timestamp(Utc::now()),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn finish_run(&self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let conn = self.writer()?;
        let updated = conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), format_timestamp(Utc::now()), run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let conn = self.reader()?;
        let run = conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        config_hash: row.get(3)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                            .unwrap_or(RunStatus::Running),
                    })
                },
            )
            .optional()?;

        Ok(run)
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        internal_id: row.get(0)?,
        record: MemberRecord {
            entity_id: row.get(1)?,
            handle: row.get(2)?,
            display_name: DisplayName {
                first: row.get(3)?,
                last: row.get(4)?,
            },
            contact: row.get(5)?,
            is_premium: row.get(6)?,
            source_group: row.get(7)?,
            last_seen: row.get(10)?,
        },
        scraped_at: parse_timestamp(row, 8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}
