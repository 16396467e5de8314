//! Tabular export port trait.

use std::path::Path;

use crate::domain::error::SalesTrackError;
use crate::domain::export::ExportTable;

/// Port for writing export tables to a file.
pub trait ExportPort {
    /// File extension without the dot, used to name the output.
    fn extension(&self) -> &'static str;

    fn write(&self, table: &ExportTable, output_path: &Path) -> Result<(), SalesTrackError>;
}
