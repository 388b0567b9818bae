//! CSV export

use crate::model::StoredRow;
use crate::output::json_output::ExportRow;
use crate::output::traits::{ExportFormat, ExportResult, Exporter, EXPORT_COLUMNS};
use std::io::Write;

/// Header-first CSV exporter with standard quoting
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn write_rows(&self, rows: &[StoredRow], out: &mut dyn Write) -> ExportResult<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(EXPORT_COLUMNS)?;

        for row in rows {
            let row = ExportRow::from(row);
            writer.write_record([
                row.entity_id.to_string(),
                row.username.unwrap_or_default(),
                row.first_name.unwrap_or_default(),
                row.last_name.unwrap_or_default(),
                row.phone.unwrap_or_default(),
                row.is_premium.to_string(),
                row.last_online.map(|t| t.to_string()).unwrap_or_default(),
                row.source_group,
                row.internal_id.to_string(),
                row.scraped_at,
                row.updated_at,
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemberRecord;
    use chrono::Utc;

    fn render(rows: &[StoredRow]) -> String {
        let mut out = Vec::new();
        CsvExporter.write_rows(rows, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn stored(internal_id: i64, record: MemberRecord) -> StoredRow {
        let now = Utc::now();
        StoredRow {
            internal_id,
            record,
            scraped_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_header_only_for_empty_snapshot() {
        assert_eq!(render(&[]), format!("{}\n", EXPORT_COLUMNS.join(",")));
    }

    #[test]
    fn test_special_characters_are_quoted() {
        let mut record = MemberRecord::new(1, "@a");
        record.display_name.first = Some("Smith, \"Jr\"".to_string());
        record.display_name.last = Some("two\nlines".to_string());
        record.is_premium = true;

        let text = render(&[stored(5, record)]);
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(headers.iter().collect::<Vec<_>>(), EXPORT_COLUMNS.to_vec());
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][2], "Smith, \"Jr\"");
        assert_eq!(&rows[0][3], "two\nlines");
        assert_eq!(&rows[0][5], "true");
        assert_eq!(&rows[0][8], "5");
    }

    #[test]
    fn test_absent_fields_are_empty() {
        let text = render(&[stored(1, MemberRecord::new(3, "@a"))]);
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let row = reader.records().next().unwrap().unwrap();

        assert_eq!(&row[0], "3");
        assert_eq!(&row[1], "");
        assert_eq!(&row[5], "false");
        assert_eq!(&row[6], "");
        assert_eq!(&row[7], "@a");
    }
}
