//! Ingestion coordinator
//!
//! Pulls one batch per target from the source client, normalizes each raw
//! record and feeds the survivors through the bounded queue to the persist
//! workers. Target-level and record-level failures only move counters; the
//! only error that escapes is a crashed worker pool.

use crate::config::IngestConfig;
use crate::ingest::report::{IngestionReport, TargetReport, TargetStatus};
use crate::ingest::shutdown::ShutdownToken;
use crate::ingest::worker::{Job, TargetTally, WorkerPool};
use crate::model::{canonical_target, normalize_record};
use crate::source::{RawRecord, SourceClient};
use crate::storage::MemberStore;
use crate::HarvestError;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drives targets from a source client into a member store
pub struct IngestionCoordinator {
    store: Arc<dyn MemberStore>,
    workers: usize,
    queue_capacity: usize,
    shutdown: ShutdownToken,
}

impl IngestionCoordinator {
    /// Creates a coordinator writing into `store`
    ///
    /// Worker count and queue capacity come from the ingest configuration and
    /// are clamped to at least one.
    pub fn new(store: Arc<dyn MemberStore>, config: &IngestConfig) -> Self {
        Self {
            store,
            workers: config.workers.max(1),
            queue_capacity: config.queue_capacity.max(1),
            shutdown: ShutdownToken::new(),
        }
    }

    /// Replaces the shutdown token, typically with one wired to Ctrl+C
    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Starts the worker pool and returns a session to feed it
    ///
    /// Must be called from within a Tokio runtime.
    pub fn begin(&self) -> IngestSession {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let pool = WorkerPool::spawn(self.workers, receiver, Arc::clone(&self.store));

        IngestSession {
            sender,
            pool,
            pending: Vec::new(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Ingests every target in order and waits for the store to catch up
    ///
    /// # Arguments
    ///
    /// * `targets` - Raw target strings; canonicalized before scraping
    /// * `max_per_target` - Upper bound passed to the client for each target
    /// * `client` - Connected source client
    ///
    /// # Returns
    ///
    /// * `Ok(IngestionReport)` - One report per target, in input order
    /// * `Err(HarvestError::WorkerPool)` - A persist worker crashed
    pub async fn run(
        &self,
        targets: &[String],
        max_per_target: u32,
        client: &dyn SourceClient,
    ) -> Result<IngestionReport, HarvestError> {
        let mut session = self.begin();

        for target in targets {
            let scraped = session.scrape_target(target, max_per_target, client).await;
            session.persist_target(scraped).await;
        }

        session.finish().await
    }
}

/// Records fetched for one target, not yet queued
#[derive(Debug)]
pub struct ScrapedTarget {
    report: TargetReport,
    records: Vec<RawRecord>,
}

impl ScrapedTarget {
    pub fn target(&self) -> &str {
        &self.report.target
    }

    pub fn received(&self) -> u64 {
        self.report.received
    }

    pub fn status(&self) -> &TargetStatus {
        &self.report.status
    }
}

/// A live worker pool plus the reports of targets handed to it
pub struct IngestSession {
    sender: mpsc::Sender<Job>,
    pool: WorkerPool,
    pending: Vec<(TargetReport, Arc<TargetTally>)>,
    shutdown: ShutdownToken,
}

impl IngestSession {
    /// Fetches the member list for one target
    ///
    /// Never fails: problems are recorded in the returned target's status.
    pub async fn scrape_target(
        &self,
        raw_target: &str,
        max: u32,
        client: &dyn SourceClient,
    ) -> ScrapedTarget {
        let mut report = TargetReport::new(raw_target, max);

        if self.shutdown.is_triggered() {
            report.status = TargetStatus::Cancelled;
            return ScrapedTarget {
                report,
                records: Vec::new(),
            };
        }

        let target = match canonical_target(raw_target) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!("Skipping target {:?}: {}", raw_target, e);
                report.status = TargetStatus::InvalidTarget(e.to_string());
                return ScrapedTarget {
                    report,
                    records: Vec::new(),
                };
            }
        };
        report.target = target;

        if max == 0 {
            tracing::info!(
                "Target {} requested 0 members, not contacting source",
                report.target
            );
            return ScrapedTarget {
                report,
                records: Vec::new(),
            };
        }

        tracing::info!(
            "Scraping up to {} members from {} via {}",
            max,
            report.target,
            client.name()
        );

        let records = match client.scrape(&report.target, max).await {
            Ok(mut records) => {
                if records.len() > max as usize {
                    tracing::warn!(
                        "Source returned {} records for {} (requested {}), discarding excess",
                        records.len(),
                        report.target,
                        max
                    );
                    records.truncate(max as usize);
                }
                records
            }
            Err(e) => {
                tracing::warn!("Failed to scrape {}: {}", report.target, e);
                report.status = TargetStatus::FetchFailed(e.to_string());
                Vec::new()
            }
        };

        report.received = records.len() as u64;
        ScrapedTarget { report, records }
    }

    /// Normalizes a scraped batch and queues it for the persist workers
    ///
    /// Waits whenever the queue is full. Stops early if shutdown is requested;
    /// records not yet queued at that point are counted as failed.
    pub async fn persist_target(&mut self, scraped: ScrapedTarget) {
        let ScrapedTarget {
            mut report,
            records,
        } = scraped;
        let tally = Arc::new(TargetTally::default());
        let mut queued = 0u64;

        let mut records = records.into_iter();
        while let Some(raw) = records.next() {
            if self.shutdown.is_triggered() {
                report.failed += 1 + records.len() as u64;
                report.status = TargetStatus::Cancelled;
                break;
            }

            let record = match normalize_record(raw, &report.target) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!("Skipping record from {}: {}", report.target, e);
                    report.skipped += 1;
                    continue;
                }
            };

            let job = Job {
                tally: Arc::clone(&tally),
                record,
            };

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    report.failed += 1 + records.len() as u64;
                    report.status = TargetStatus::Cancelled;
                    break;
                }
                sent = self.sender.send(job) => match sent {
                    Ok(()) => queued += 1,
                    Err(_) => {
                        tracing::error!("Persist queue closed while ingesting {}", report.target);
                        report.failed += 1;
                    }
                },
            }
        }

        if report.status == TargetStatus::Cancelled {
            tracing::warn!(
                "Ingestion of {} cancelled after queueing {} records",
                report.target,
                queued
            );
        } else {
            tracing::info!(
                "Queued {} of {} records from {} ({} skipped)",
                queued,
                report.received,
                report.target,
                report.skipped
            );
        }

        self.pending.push((report, tally));
    }

    /// Closes the queue, waits for the workers to drain it and assembles the
    /// final report
    ///
    /// # Returns
    ///
    /// * `Ok(IngestionReport)` - Balanced per-target reports
    /// * `Err(HarvestError::WorkerPool)` - A persist worker crashed
    pub async fn finish(self) -> Result<IngestionReport, HarvestError> {
        drop(self.sender);
        self.pool.join().await.map_err(HarvestError::WorkerPool)?;

        let targets = self
            .pending
            .into_iter()
            .map(|(mut report, tally)| {
                report.inserted = tally.inserted();
                report.updated = tally.updated();
                report.persisted = report.inserted + report.updated;
                report.failed += tally.failed();
                report
            })
            .collect();

        Ok(IngestionReport { targets })
    }
}
