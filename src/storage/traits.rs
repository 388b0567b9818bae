//! Storage traits and error types
//!
//! This module defines the trait interface for member stores and the
//! associated error types.

use crate::model::{MemberRecord, StoredRow};
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot open store at {path}: {reason}")]
    Unavailable { path: String, reason: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unsupported schema version {found} (expected at most {expected})")]
    SchemaVersion { found: i64, expected: i64 },

    #[error("Store lock poisoned by a panicked writer")]
    LockPoisoned,

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What an upsert did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was created with this internal id
    Inserted(i64),

    /// The existing row with this internal id was refreshed
    Updated(i64),
}

impl UpsertOutcome {
    pub fn internal_id(&self) -> i64 {
        match self {
            Self::Inserted(id) | Self::Updated(id) => *id,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Trait for member store implementations
///
/// Implementations must be safe to share between persist workers: every
/// method takes `&self` and synchronizes internally. Upserts of the same key
/// are serialized; readers (`count`, `snapshot`) never observe a partially
/// applied upsert.
pub trait MemberStore: Send + Sync {
    // ===== Members =====

    /// Inserts the record or refreshes the mutable fields of the row with the
    /// same (`entity_id`, `source_group`) key
    ///
    /// The first-seen timestamp and internal id of an existing row are kept.
    fn upsert(&self, record: &MemberRecord) -> StorageResult<UpsertOutcome>;

    /// Number of distinct stored keys
    fn count(&self) -> StorageResult<u64>;

    /// Point-in-time view of all rows in creation order
    fn snapshot(&self) -> StorageResult<Vec<StoredRow>>;

    /// Looks up a single row by key
    fn get(&self, entity_id: i64, source_group: &str) -> StorageResult<Option<StoredRow>>;

    // ===== Statistics =====

    /// Row counts per source group, sorted by group
    fn count_by_group(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Number of rows flagged premium
    fn count_premium(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Records the start of a pipeline run
    fn create_run(&self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with the given status
    fn finish_run(&self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
