//! Pipeline orchestrator - one run from connect to export
//!
//! This module owns the lifecycle of a single run:
//! - Connecting the source client
//! - Opening (or receiving) the member store and recording the run
//! - Driving the ingestion coordinator target by target
//! - Exporting one snapshot after every target is persisted

use crate::config::{Config, DEFAULT_CONFIG_HASH};
use crate::ingest::{IngestionCoordinator, IngestionReport, ShutdownToken};
use crate::pipeline::export_store;
use crate::pipeline::summary::RunSummary;
use crate::source::{credentials_from_config, SourceClient};
use crate::state::PipelineState;
use crate::storage::{open_store, MemberStore, RunStatus};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;

/// Main pipeline structure
pub struct Pipeline {
    config: Config,
    config_hash: String,
    client: Box<dyn SourceClient>,
    store: Option<Arc<dyn MemberStore>>,
    shutdown: ShutdownToken,
    state: PipelineState,
}

impl Pipeline {
    /// Creates a pipeline that opens the store named in the configuration
    pub fn new(config: Config, client: Box<dyn SourceClient>) -> Self {
        Self {
            config,
            config_hash: DEFAULT_CONFIG_HASH.to_string(),
            client,
            store: None,
            shutdown: ShutdownToken::new(),
            state: PipelineState::Idle,
        }
    }

    /// Creates a pipeline writing into an already open store
    pub fn with_store(
        config: Config,
        client: Box<dyn SourceClient>,
        store: Arc<dyn MemberStore>,
    ) -> Self {
        let mut pipeline = Self::new(config, client);
        pipeline.store = Some(store);
        pipeline
    }

    /// Sets the configuration hash recorded with the run
    pub fn config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    /// Uses an externally controlled shutdown token
    pub fn shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs the pipeline over `targets`
    ///
    /// # Arguments
    ///
    /// * `targets` - Raw scrape targets, processed in order
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run reached `Done`; the summary may still
    ///   carry an export error
    /// * `Err(HarvestError)` - The run ended in `Failed` (authentication,
    ///   store, or worker pool failure)
    pub async fn run(&mut self, targets: &[String]) -> Result<RunSummary, HarvestError> {
        if self.state != PipelineState::Idle {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: PipelineState::Connected,
            });
        }

        tracing::info!(
            "Starting run over {} targets with {} source",
            targets.len(),
            self.client.name()
        );

        // Connect
        self.advance(PipelineState::Connected)?;
        let credentials = credentials_from_config(&self.config);
        if let Err(e) = self.client.connect(credentials.as_ref()).await {
            return Err(self.fail(HarvestError::Auth(e.to_string())));
        }

        // Store and run bookkeeping
        let store = match self.store.clone() {
            Some(store) => store,
            None => {
                let path = Path::new(&self.config.storage.database_path);
                match open_store(path) {
                    Ok(store) => Arc::new(store) as Arc<dyn MemberStore>,
                    Err(e) => {
                        return Err(self.fail(HarvestError::StorageUnavailable(e.to_string())))
                    }
                }
            }
        };

        let run_id = match store.create_run(&self.config_hash) {
            Ok(id) => id,
            Err(e) => return Err(self.fail(e.into())),
        };
        tracing::info!("Recorded run {}", run_id);

        // Scrape and persist
        let report = match self.ingest(Arc::clone(&store), targets).await {
            Ok(report) => report,
            Err(e) => {
                if let Err(mark) = store.finish_run(run_id, RunStatus::Failed) {
                    tracing::warn!("Failed to mark run {} failed: {}", run_id, mark);
                }
                return Err(self.fail(e));
            }
        };

        // Export
        self.advance(PipelineState::Exporting)?;
        let (stored_rows, exported, export_error) =
            match export_store(store.as_ref(), &self.config.export) {
                Ok((rows, paths)) => (Some(rows as u64), paths, None),
                Err(e) => {
                    tracing::error!("Export failed: {}", e);
                    let rows = match store.count() {
                        Ok(rows) => Some(rows),
                        Err(count_error) => {
                            tracing::warn!("Could not count stored rows: {}", count_error);
                            None
                        }
                    };
                    (rows, Vec::new(), Some(e.to_string()))
                }
            };

        let interrupted = self.shutdown.is_triggered();
        let status = if interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        if let Err(e) = store.finish_run(run_id, status) {
            tracing::warn!("Failed to record end of run {}: {}", run_id, e);
        }

        self.advance(PipelineState::Done)?;
        tracing::info!(
            "Run {} done: {} rows stored, {} artifacts written",
            run_id,
            stored_rows.map_or_else(|| "unknown".to_string(), |n| n.to_string()),
            exported.len()
        );

        Ok(RunSummary {
            run_id,
            state: self.state,
            report,
            stored_rows,
            exported,
            export_error,
            interrupted,
        })
    }

    async fn ingest(
        &mut self,
        store: Arc<dyn MemberStore>,
        targets: &[String],
    ) -> Result<IngestionReport, HarvestError> {
        let coordinator = IngestionCoordinator::new(store, &self.config.ingest)
            .with_shutdown(self.shutdown.clone());
        let max = self.config.ingest.max_members;
        let mut session = coordinator.begin();

        for target in targets {
            self.advance(PipelineState::Scraping)?;
            let scraped = session
                .scrape_target(target, max, self.client.as_ref())
                .await;
            tracing::debug!(
                "Scraped {} records from {} ({})",
                scraped.received(),
                scraped.target(),
                scraped.status()
            );

            self.advance(PipelineState::Persisting)?;
            session.persist_target(scraped).await;
        }

        session.finish().await
    }

    fn advance(&mut self, next: PipelineState) -> Result<(), HarvestError> {
        self.state = self.state.transition(next)?;
        tracing::debug!("Pipeline state: {}", self.state);
        Ok(())
    }

    fn fail(&mut self, error: HarvestError) -> HarvestError {
        tracing::error!("Run failed in state {}: {}", self.state, error);
        match self.state.transition(PipelineState::Failed) {
            Ok(state) => {
                self.state = state;
                error
            }
            Err(transition) => transition,
        }
    }
}
