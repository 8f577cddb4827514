// file: src/exporter/xlsx.rs
// description: spreadsheet export of result tables
// reference: https://docs.rs/rust_xlsxwriter

use crate::error::{ClientError, Result};
use crate::exporter::rows::ResultTable;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct XlsxExporter {
    output_dir: PathBuf,
}

impl XlsxExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Writes one worksheet from the table and returns the file path. Purely
    /// local; nothing is sent back to any service.
    pub fn write(&self, table: &ResultTable, file_stem: &str, sheet_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{}.xlsx", file_stem));
        self.write_to(table, &path, sheet_name)?;
        Ok(path)
    }

    fn write_to(&self, table: &ResultTable, path: &Path, sheet_name: &str) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name)
            .map_err(|e| ClientError::Export(e.to_string()))?;

        for (col, header) in table.headers.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, header)
                .map_err(|e| ClientError::Export(e.to_string()))?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                worksheet
                    .write_string((row_idx + 1) as u32, col as u16, value)
                    .map_err(|e| ClientError::Export(e.to_string()))?;
            }
        }

        workbook
            .save(path)
            .map_err(|e| ClientError::Export(e.to_string()))?;

        info!(
            "Wrote {} rows to {}",
            table.rows.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workbook_written() {
        let dir = tempdir().unwrap();
        let exporter = XlsxExporter::new(dir.path()).unwrap();

        let table = ResultTable {
            headers: vec!["Satır".to_string(), "Kaynak".to_string()],
            rows: vec![vec!["1".to_string(), "clip-1".to_string()]],
        };

        let path = exporter.write(&table, "kunye_sonuclari", "Künye Sonuçları").unwrap();
        assert!(path.exists());
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn test_exporter_creates_output_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("exports/batch");
        let exporter = XlsxExporter::new(&nested);
        assert!(exporter.is_ok());
        assert!(nested.is_dir());
    }
}
