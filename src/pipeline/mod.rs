//! Pipeline module for whole-run orchestration
//!
//! This module ties the other components together for a single run:
//! - Source connection and run bookkeeping
//! - Target-by-target ingestion with state tracking
//! - Snapshot export and the final run summary

mod orchestrator;
mod summary;

pub use orchestrator::Pipeline;
pub use summary::{RunSummary, EXIT_FATAL, EXIT_OK};

use crate::config::{Config, ExportConfig};
use crate::ingest::ShutdownToken;
use crate::output::export_all;
use crate::source::build_client;
use crate::storage::MemberStore;
use crate::HarvestError;
use chrono::Utc;
use std::path::PathBuf;

/// Runs a complete harvest with the client selected by the configuration
///
/// This is the main entry point for a run. It will:
/// 1. Build and connect the source client
/// 2. Open the member store and record the run
/// 3. Scrape and persist every target
/// 4. Export one snapshot of the store
///
/// # Arguments
///
/// * `config` - The pipeline configuration
/// * `config_hash` - Hash recorded with the run
/// * `targets` - Raw scrape targets
/// * `shutdown` - Token that stops ingestion early when triggered
pub async fn harvest(
    config: Config,
    config_hash: &str,
    targets: &[String],
    shutdown: ShutdownToken,
) -> Result<RunSummary, HarvestError> {
    let client = build_client(&config)?;
    Pipeline::new(config, client)
        .config_hash(config_hash)
        .shutdown(shutdown)
        .run(targets)
        .await
}

/// Snapshots the store and writes one artifact per configured format
///
/// # Returns
///
/// * `Ok((rows, paths))` - Number of exported rows and written artifacts
/// * `Err(HarvestError)` - The snapshot or an artifact write failed
pub fn export_store(
    store: &dyn MemberStore,
    export: &ExportConfig,
) -> Result<(usize, Vec<PathBuf>), HarvestError> {
    let rows = store.snapshot()?;
    let stamp = Utc::now().timestamp();

    let paths = export_all(
        &rows,
        &export.formats,
        &export.directory,
        &export.base_name,
        stamp,
    )?;

    Ok((rows.len(), paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemberRecord;
    use crate::output::ExportFormat;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_export_store_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStorage::open(&dir.path().join("export.db")).unwrap();
        store.upsert(&MemberRecord::new(1, "@a")).unwrap();
        store.upsert(&MemberRecord::new(2, "@a")).unwrap();

        let export = ExportConfig {
            directory: dir.path().to_path_buf(),
            base_name: "snap".to_string(),
            formats: vec![ExportFormat::Csv],
        };
        let (rows, paths) = export_store(&store, &export).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(paths.len(), 1);
        let name = paths[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("snap_") && name.ends_with(".csv"));
    }

    #[tokio::test]
    async fn test_harvest_with_synthetic_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = dir.path().join("h.db").display().to_string();
        config.export.directory = dir.path().to_path_buf();
        config.source.request_delay_ms = 0;
        config.ingest.max_members = 120;

        let summary = harvest(config, "defaults", &["@demo".to_string()], ShutdownToken::new())
            .await
            .unwrap();

        let demo = &summary.report.targets[0];
        assert_eq!(demo.received, 120);
        assert!(demo.is_balanced());
        assert_eq!(summary.stored_rows, Some(demo.inserted));
    }
}
