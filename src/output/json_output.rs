//! JSON export
//!
//! Rows are written as one pretty-printed array. Absent optional fields are
//! serialized as explicit `null` so every object carries the full column set.

use crate::model::StoredRow;
use crate::output::traits::{ExportFormat, ExportResult, Exporter};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Flat view of a stored row; field order is the column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub entity_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_premium: bool,
    pub last_online: Option<i64>,
    pub source_group: String,
    pub internal_id: i64,
    pub scraped_at: String,
    pub updated_at: String,
}

impl From<&StoredRow> for ExportRow {
    fn from(row: &StoredRow) -> Self {
        let record = &row.record;
        Self {
            entity_id: record.entity_id,
            username: record.handle.clone(),
            first_name: record.display_name.first.clone(),
            last_name: record.display_name.last.clone(),
            phone: record.contact.clone(),
            is_premium: record.is_premium,
            last_online: record.last_seen,
            source_group: record.source_group.clone(),
            internal_id: row.internal_id,
            scraped_at: row.scraped_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            updated_at: row.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Pretty-printed JSON array exporter
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn write_rows(&self, rows: &[StoredRow], out: &mut dyn Write) -> ExportResult<()> {
        let rows: Vec<ExportRow> = rows.iter().map(ExportRow::from).collect();
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
