//! CSV export adapter.

use std::fs::File;
use std::path::Path;

use crate::domain::error::SalesTrackError;
use crate::domain::export::ExportTable;
use crate::ports::export_port::ExportPort;

/// Writes one table per file: a header row, then one row per record.
pub struct CsvExportAdapter;

impl ExportPort for CsvExportAdapter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, table: &ExportTable, output_path: &Path) -> Result<(), SalesTrackError> {
        table.ensure_not_empty()?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(output_path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(table.headers).map_err(csv_error)?;
        for row in &table.rows {
            writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .map_err(csv_error)?;
        }
        writer.flush()?;

        tracing::info!(
            sheet = table.sheet,
            rows = table.rows.len(),
            path = %output_path.display(),
            "export written"
        );
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> SalesTrackError {
    SalesTrackError::Io(std::io::Error::other(e))
}
