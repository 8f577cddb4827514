// file: src/exporter/mod.rs
// description: client-side export of aggregated results

pub mod json;
pub mod rows;
pub mod xlsx;

pub use json::{ExportManifest, JsonExporter};
pub use rows::{iflas_table, kunye_table, ocr_table, ResultTable};
pub use xlsx::XlsxExporter;
