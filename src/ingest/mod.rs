//! Ingestion module
//!
//! Moves member lists from a source client into the member store:
//! - per-target scraping, target canonicalization and record normalization
//! - a bounded queue feeding a fixed pool of blocking persist workers
//! - per-target accounting and cooperative shutdown

mod coordinator;
mod report;
mod shutdown;
mod worker;

pub use coordinator::{IngestSession, IngestionCoordinator, ScrapedTarget};
pub use report::{IngestionReport, TargetReport, TargetStatus};
pub use shutdown::ShutdownToken;
