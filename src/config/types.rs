use crate::output::ExportFormat;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Roster-Harvest
///
/// Every section is optional in the TOML file; missing sections take their
/// defaults so the binary can run without any configuration at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
}

/// Ingestion worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Number of persist workers draining the record queue
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the bounded queue between the coordinator and the workers
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Maximum members requested per target when the CLI does not say
    #[serde(rename = "max-members", default = "default_max_members")]
    pub max_members: u32,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

/// Export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory the export artifacts are written to
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,

    /// Base name for `<base>_<timestamp>.<ext>` artifacts
    #[serde(rename = "base-name", default = "default_base_name")]
    pub base_name: String,

    #[serde(default = "default_formats")]
    pub formats: Vec<ExportFormat>,
}

/// Which source client implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Synthetic,
    Fixture,
}

/// Source client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// JSON fixture replayed by the fixture client
    #[serde(rename = "fixture-path", default)]
    pub fixture_path: Option<PathBuf>,

    /// Pause between successive search patterns (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

/// Remote account credentials
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    #[serde(rename = "api-id")]
    pub api_id: i32,

    #[serde(rename = "api-hash")]
    pub api_hash: String,

    #[serde(rename = "session-file", default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_members() -> u32 {
    500
}

fn default_database_path() -> String {
    "./roster.db".to_string()
}

fn default_export_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_base_name() -> String {
    "native_scrape_results".to_string()
}

fn default_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Json, ExportFormat::Csv]
}

fn default_request_delay_ms() -> u64 {
    100
}

fn default_session_file() -> PathBuf {
    PathBuf::from("roster.session")
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_members: default_max_members(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
            base_name: default_base_name(),
            formats: default_formats(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            fixture_path: None,
            request_delay_ms: default_request_delay_ms(),
        }
    }
}
