// file: src/models/record.rs
// description: per-record outcomes and batch summary counters
// reference: internal data structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    Error,
}

/// Summary counters for a batch job. Taken verbatim from the service payload
/// when present; never recomputed client-side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: u64,
    pub processed: u64,
    pub successful: u64,
    pub failed: u64,
}

/// One person entry inside an extracted record (`kisiler` list).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub ad_soyad: Option<String>,
    pub gorev: Option<String>,
    pub telefon: Option<String>,
    pub email: Option<String>,
}

/// The outcome for one input item within a job. Immutable once created and
/// owned by the job that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    /// 1-based position as reported by the service, stable for export rows.
    pub index: u64,
    /// User-supplied correlation key (clip id, publication name, filename).
    pub source_id: String,
    pub status: RecordStatus,
    /// Extracted field name -> value; empty unless `status` is `Success`.
    pub fields: Map<String, Value>,
    /// Unprocessed intermediate text kept for audit and export.
    pub raw_text: Option<String>,
    /// Present only when `status` is `Error`.
    pub error_message: Option<String>,
}

impl RecordResult {
    pub fn success(index: u64, source_id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            index,
            source_id: source_id.into(),
            status: RecordStatus::Success,
            fields,
            raw_text: None,
            error_message: None,
        }
    }

    pub fn error(index: u64, source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            index,
            source_id: source_id.into(),
            status: RecordStatus::Error,
            fields: Map::new(),
            raw_text: None,
            error_message: Some(message.into()),
        }
    }

    pub fn with_raw_text(mut self, raw_text: Option<String>) -> Self {
        self.raw_text = raw_text;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }

    /// Scalar field value rendered as a cell string. Nested lists and objects
    /// are skipped; those are expanded by the exporter instead.
    pub fn scalar(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The nested person list (`kisiler`), empty when absent or null.
    pub fn people(&self) -> Vec<Person> {
        match self.fields.get("kisiler") {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
            None => Vec::new(),
        }
    }
}
