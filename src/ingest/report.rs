//! Per-target ingestion reports

use std::fmt;

/// How processing of one target ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// Every received record was normalized and handed to the workers
    Completed,

    /// The source client could not deliver the member list
    FetchFailed(String),

    /// The target string could not be canonicalized
    InvalidTarget(String),

    /// Shutdown was requested before the target finished enqueueing
    Cancelled,
}

impl TargetStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::FetchFailed(_) => "fetch_failed",
            Self::InvalidTarget(_) => "invalid_target",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed(reason) | Self::InvalidTarget(reason) => {
                write!(f, "{} ({})", self.label(), reason)
            }
            _ => write!(f, "{}", self.label()),
        }
    }
}

/// Counters for a single target
///
/// Once the worker pool has drained, `received == persisted + skipped + failed`
/// holds, with `persisted == inserted + updated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    /// Canonical form of the target, or the raw input when it had none
    pub target: String,
    pub requested: u32,
    pub received: u64,
    pub persisted: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
    pub status: TargetStatus,
}

impl TargetReport {
    /// Creates an empty report for a target
    pub fn new(target: impl Into<String>, requested: u32) -> Self {
        Self {
            target: target.into(),
            requested,
            received: 0,
            persisted: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            status: TargetStatus::Completed,
        }
    }

    /// Returns true if every received record is accounted for
    pub fn is_balanced(&self) -> bool {
        self.received == self.persisted + self.skipped + self.failed
            && self.persisted == self.inserted + self.updated
    }
}

/// Outcome of one ingestion pass, one entry per target in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub targets: Vec<TargetReport>,
}

impl IngestionReport {
    pub fn total_received(&self) -> u64 {
        self.targets.iter().map(|t| t.received).sum()
    }

    pub fn total_persisted(&self) -> u64 {
        self.targets.iter().map(|t| t.persisted).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.targets.iter().map(|t| t.skipped).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.targets.iter().map(|t| t.failed).sum()
    }

    /// Looks up the report for a canonical target
    pub fn target(&self, target: &str) -> Option<&TargetReport> {
        self.targets.iter().find(|t| t.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_balanced() {
        let report = TargetReport::new("@a", 50);
        assert!(report.is_balanced());
        assert_eq!(report.status, TargetStatus::Completed);
    }

    #[test]
    fn test_unbalanced_report_detected() {
        let mut report = TargetReport::new("@a", 50);
        report.received = 3;
        report.persisted = 2;
        report.inserted = 2;
        assert!(!report.is_balanced());

        report.skipped = 1;
        assert!(report.is_balanced());
    }

    #[test]
    fn test_totals() {
        let mut a = TargetReport::new("@a", 10);
        a.received = 4;
        a.persisted = 3;
        a.skipped = 1;
        let mut b = TargetReport::new("@b", 10);
        b.received = 2;
        b.failed = 2;

        let report = IngestionReport {
            targets: vec![a, b],
        };

        assert_eq!(report.total_received(), 6);
        assert_eq!(report.total_persisted(), 3);
        assert_eq!(report.total_skipped(), 1);
        assert_eq!(report.total_failed(), 2);
        assert_eq!(report.target("@b").map(|t| t.failed), Some(2));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TargetStatus::Completed.to_string(), "completed");
        assert_eq!(
            TargetStatus::FetchFailed("timeout".to_string()).to_string(),
            "fetch_failed (timeout)"
        );
    }
}
