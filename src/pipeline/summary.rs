//! Run summary returned by the orchestrator

use crate::ingest::IngestionReport;
use crate::state::PipelineState;
use std::path::PathBuf;

/// Process exit code for a run that reached `Done`
pub const EXIT_OK: i32 = 0;

/// Process exit code for a run aborted by a fatal-tier failure
pub const EXIT_FATAL: i32 = 1;

/// Everything a caller needs to know about one finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Id of the bookkeeping row in the `runs` table
    pub run_id: i64,

    pub state: PipelineState,

    /// Per-target counters in input order
    pub report: IngestionReport,

    /// Rows in the store when the export snapshot was taken; `None` when
    /// the store could not be counted after a failed export
    pub stored_rows: Option<u64>,

    /// Artifacts written, in configured format order
    pub exported: Vec<PathBuf>,

    /// Set when the export step failed; ingestion results are still durable
    pub export_error: Option<String>,

    /// True if shutdown was requested during the run
    pub interrupted: bool,
}

impl RunSummary {
    /// Per-target and export failures are reported, not escalated: any run
    /// that reached `Done` exits cleanly.
    pub fn exit_code(&self) -> i32 {
        if self.state == PipelineState::Done {
            EXIT_OK
        } else {
            EXIT_FATAL
        }
    }
}
