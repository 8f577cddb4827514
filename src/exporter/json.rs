// file: src/exporter/json.rs
// description: json export of aggregated results with a manifest

use crate::error::Result;
use crate::models::record::{BatchSummary, RecordResult};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
    pretty: bool,
}

#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub exported_at: String,
    pub total_records: usize,
    pub summary: Option<BatchSummary>,
    pub records: Vec<RecordResult>,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>, pretty: bool) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir, pretty })
    }

    pub fn export(
        &self,
        records: &[RecordResult],
        summary: Option<BatchSummary>,
        file_stem: &str,
    ) -> Result<PathBuf> {
        let manifest = ExportManifest {
            exported_at: Utc::now().to_rfc3339(),
            total_records: records.len(),
            summary,
            records: records.to_vec(),
        };

        let path = self.output_dir.join(format!("{}.json", file_stem));
        self.write_manifest(&manifest, &path)?;

        info!(
            "Export complete: {} records written to {}",
            manifest.total_records,
            path.display()
        );
        Ok(path)
    }

    fn write_manifest(&self, manifest: &ExportManifest, path: &Path) -> Result<()> {
        let body = if self.pretty {
            serde_json::to_string_pretty(manifest)?
        } else {
            serde_json::to_string(manifest)?
        };
        fs::write(path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    #[test]
    fn test_export_writes_manifest() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path(), true).unwrap();

        let records = vec![RecordResult::error(3, "10295", "timeout")];
        let summary = Some(BatchSummary {
            total: 3,
            processed: 3,
            successful: 2,
            failed: 1,
        });

        let path = exporter.export(&records, summary, "batch_sonuclari").unwrap();
        let body: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(body["total_records"], 1);
        assert_eq!(body["summary"]["failed"], 1);
        assert_eq!(body["records"][0]["error_message"], "timeout");
    }

    #[test]
    fn test_exporter_creation() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path(), false);
        assert!(exporter.is_ok());
    }
}
