//! Exporter traits and types
//!
//! This module defines the trait interface for export formats and the
//! associated error types.

use crate::model::StoredRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use thiserror::Error;

/// Column names shared by every export format, in output order
pub const EXPORT_COLUMNS: [&str; 11] = [
    "entity_id",
    "username",
    "first_name",
    "last_name",
    "phone",
    "is_premium",
    "last_online",
    "source_group",
    "internal_id",
    "scraped_at",
    "updated_at",
];

/// Errors that can occur during export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Supported artifact formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// File extension used for artifacts of this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Trait for export format implementations
///
/// An exporter only renders rows into a byte stream; where the bytes end up
/// and how the file is replaced is handled by the caller.
pub trait Exporter {
    /// The format this exporter produces
    fn format(&self) -> ExportFormat;

    /// Renders `rows` in order into `out`
    ///
    /// # Arguments
    ///
    /// * `rows` - Snapshot rows, already in creation order
    /// * `out` - Destination stream
    fn write_rows(&self, rows: &[StoredRow], out: &mut dyn Write) -> ExportResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let formats: Vec<ExportFormat> = serde_json::from_str(r#"["json", "csv"]"#).unwrap();
        assert_eq!(formats, vec![ExportFormat::Json, ExportFormat::Csv]);
        assert!(serde_json::from_str::<ExportFormat>(r#""xml""#).is_err());
    }
}
