//! Roster-Harvest: a member roster ingestion pipeline
//!
//! This crate pulls member records for one or more channel targets from a
//! source client, deduplicates them into a durable SQLite table keyed by
//! (entity id, source group), and exports the stored rows as JSON and CSV.

pub mod config;
pub mod ingest;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Roster-Harvest operations
///
/// Only the variants produced before scraping starts (configuration,
/// authentication, storage initialization) abort a run. Per-target and
/// per-record failures are absorbed into counters and never surface here.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("Source error: {0}")]
    Source(#[from] source::SourceError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PipelineState,
        to: state::PipelineState,
    },

    #[error("Persist worker pool failed: {0}")]
    WorkerPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Roster-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{canonical_target, DisplayName, MemberRecord, StoredRow};
pub use state::PipelineState;
