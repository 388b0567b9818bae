//! Record model for Roster-Harvest
//!
//! This module defines the canonical member representation and the rules that
//! turn untrusted source data into it:
//! - `MemberRecord` / `StoredRow` types
//! - raw record normalization and validation
//! - scrape target canonicalization

mod normalize;
mod record;
mod target;

pub use normalize::normalize_record;
pub use record::{DisplayName, MemberRecord, StoredRow};
pub use target::canonical_target;

use thiserror::Error;

/// Per-record (or per-target) validation failures
///
/// A record failing validation is skipped and counted; it never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record has no entity id")]
    MissingEntityId,

    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),
}
