//! Statistics generation from the member store
//!
//! This module provides functionality for extracting and displaying store
//! statistics and per-run ingestion reports.

use crate::ingest::IngestionReport;
use crate::storage::{MemberStore, RunRecord, StorageResult};

/// Member store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Total number of stored rows
    pub total_rows: u64,

    /// Row count per source group, sorted by group
    pub rows_by_group: Vec<(String, u64)>,

    /// Number of premium members
    pub premium_rows: u64,

    /// Most recent pipeline run, if any
    pub latest_run: Option<RunRecord>,
}

impl StoreStatistics {
    /// Share of premium rows as a percentage
    pub fn premium_rate(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        (self.premium_rows as f64 / self.total_rows as f64) * 100.0
    }
}

/// Loads statistics from the store
///
/// # Arguments
///
/// * `store` - The store to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(store: &dyn MemberStore) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        total_rows: store.count()?,
        rows_by_group: store.count_by_group()?,
        premium_rows: store.count_premium()?,
        latest_run: store.latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Member Store Statistics ===\n");

    println!("Overview:");
    println!("  Total members stored: {}", stats.total_rows);
    println!("  Source groups: {}", stats.rows_by_group.len());
    println!(
        "  Premium members: {} ({:.1}%)",
        stats.premium_rows,
        stats.premium_rate()
    );
    println!();

    if !stats.rows_by_group.is_empty() {
        println!("Members by Group:");
        // Largest groups first
        let mut groups: Vec<_> = stats.rows_by_group.iter().collect();
        groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for (group, count) in groups {
            println!("  {}: {}", group, count);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Id: {}", run.id);
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Status: {}", run.status.to_db_string());
            println!("  Config hash: {}", run.config_hash);
        }
        None => println!("No pipeline runs recorded."),
    }
}

/// Prints per-target ingestion counts to stdout
pub fn print_ingestion_report(report: &IngestionReport) {
    println!("=== Ingestion Report ===\n");

    for target in &report.targets {
        println!("{} [{}]", target.target, target.status);
        println!(
            "  requested {}, received {}, persisted {} ({} new, {} updated), skipped {}, failed {}",
            target.requested,
            target.received,
            target.persisted,
            target.inserted,
            target.updated,
            target.skipped,
            target.failed
        );
    }
    println!();

    println!(
        "Totals: received {}, persisted {}, skipped {}, failed {}",
        report.total_received(),
        report.total_persisted(),
        report.total_skipped(),
        report.total_failed()
    );
}
