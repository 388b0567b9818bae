//! Output module for exporting stored members and reporting runs
//!
//! This module handles:
//! - Rendering snapshot rows as JSON and CSV
//! - Replacing artifact files atomically
//! - Printing store statistics and ingestion reports

mod atomic;
mod csv_output;
mod json_output;
pub mod stats;
mod traits;

pub use atomic::write_atomic;
pub use csv_output::CsvExporter;
pub use json_output::{ExportRow, JsonExporter};
pub use stats::{load_statistics, print_ingestion_report, print_statistics, StoreStatistics};
pub use traits::{ExportError, ExportFormat, ExportResult, Exporter, EXPORT_COLUMNS};

use crate::model::StoredRow;
use std::path::{Path, PathBuf};

/// Returns the exporter for a format
pub fn exporter_for(format: ExportFormat) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Json => Box::new(JsonExporter),
        ExportFormat::Csv => Box::new(CsvExporter),
    }
}

/// Writes `rows` to `destination` in the given format
///
/// # Arguments
///
/// * `rows` - Snapshot rows in creation order
/// * `format` - Output format
/// * `destination` - File to create or replace
///
/// # Returns
///
/// * `Ok(())` - The destination now holds the complete export
/// * `Err(ExportError)` - Nothing was replaced
pub fn export(rows: &[StoredRow], format: ExportFormat, destination: &Path) -> ExportResult<()> {
    let exporter = exporter_for(format);
    write_atomic(destination, |out| exporter.write_rows(rows, out))?;

    tracing::info!(
        "Exported {} rows as {} to {}",
        rows.len(),
        exporter.format(),
        destination.display()
    );
    Ok(())
}

/// Artifact path for one format: `<dir>/<base_name>_<stamp>.<ext>`
pub fn artifact_path(dir: &Path, base_name: &str, stamp: i64, format: ExportFormat) -> PathBuf {
    dir.join(format!("{}_{}.{}", base_name, stamp, format.extension()))
}

/// Exports `rows` once per format
///
/// Stops at the first failing format; artifacts already written stay.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Written artifacts, in `formats` order
/// * `Err(ExportError)` - The first failure
pub fn export_all(
    rows: &[StoredRow],
    formats: &[ExportFormat],
    dir: &Path,
    base_name: &str,
    stamp: i64,
) -> ExportResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(formats.len());

    for format in formats {
        let path = artifact_path(dir, base_name, stamp, *format);
        export(rows, *format, &path)?;
        written.push(path);
    }

    Ok(written)
}
