// file: src/models/wire.rs
// description: serde types for the pipeline service wire contracts
// reference: MTM pipeline service HTTP APIs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ticket returned by async submission endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskTicket {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from `GET .../status/{task_id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteTaskStatus {
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Download paths keyed by track/part name, present once completed.
    #[serde(default)]
    pub downloads: Option<BTreeMap<String, String>>,
}

impl RemoteTaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed")
    }

    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }
}

/// Batch endpoint payload: authoritative counters plus per-row outcomes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchResponse {
    pub total: u64,
    pub processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub results: Vec<BatchRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchRecord {
    pub row: u64,
    #[serde(default, alias = "yayin_adi")]
    pub clip_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, alias = "raw_html_text")]
    pub raw_ocr_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// OCR services answer either a bare `{text}` object or a per-file array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OcrResponse {
    Many(Vec<OcrItem>),
    Single { text: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrItem {
    #[serde(default)]
    pub filename: Option<String>,
    pub text: String,
}

impl OcrResponse {
    pub fn into_items(self) -> Vec<OcrItem> {
        match self {
            OcrResponse::Many(items) => items,
            OcrResponse::Single { text } => vec![OcrItem {
                filename: None,
                text,
            }],
        }
    }
}

/// One framed event from a streaming endpoint, dispatched by its `type` tag.
///
/// An `error` event that names a row is a per-record failure; only a rowless
/// `error` is fatal for the whole job.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Init {
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        message: Option<String>,
    },
    Progress {
        #[serde(default)]
        row: Option<u64>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        step: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Success {
        #[serde(default)]
        row: Option<u64>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        message: Option<String>,
    },
    NewsFound {
        #[serde(default)]
        index: Option<u64>,
        #[serde(default)]
        item: Option<Value>,
        #[serde(default)]
        message: Option<String>,
    },
    Complete {
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        processed: Option<u64>,
        #[serde(default)]
        successful: Option<u64>,
        #[serde(default)]
        failed: Option<u64>,
        #[serde(default)]
        results: Option<Value>,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        #[serde(default)]
        row: Option<u64>,
        #[serde(default)]
        total: Option<u64>,
        message: String,
    },
    /// Unknown event types only update display state and never fail the job.
    #[serde(other)]
    Other,
}

impl StreamEvent {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StreamEvent::Error { row: None, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ocr_single_shape() {
        let items: Vec<OcrItem> = serde_json::from_value::<OcrResponse>(json!({"text": "ABC"}))
            .unwrap()
            .into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "ABC");
    }

    #[test]
    fn test_ocr_array_shape() {
        let payload = json!([
            {"filename": "a.jpg", "text": "first"},
            {"filename": "b.jpg", "text": "second"}
        ]);
        let items = serde_json::from_value::<OcrResponse>(payload)
            .unwrap()
            .into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].filename.as_deref(), Some("b.jpg"));
    }

    #[test]
    fn test_batch_record_source_alias() {
        let record: BatchRecord = serde_json::from_value(json!({
            "row": 2,
            "yayin_adi": "Sabah",
            "status": "success",
            "data": {"adres": "Ankara"}
        }))
        .unwrap();
        assert_eq!(record.clip_id.as_deref(), Some("Sabah"));
    }

    #[test]
    fn test_remote_status_terminal() {
        let status: RemoteTaskStatus =
            serde_json::from_value(json!({"status": "completed", "progress": 100, "total": 100}))
                .unwrap();
        assert!(status.is_terminal());
        assert!(!status.is_failed());

        let pending: RemoteTaskStatus =
            serde_json::from_value(json!({"status": "processing"})).unwrap();
        assert!(!pending.is_terminal());
    }

    #[test]
    fn test_stream_event_dispatch() {
        let init: StreamEvent =
            serde_json::from_value(json!({"type": "init", "total": 5})).unwrap();
        assert!(matches!(init, StreamEvent::Init { total: Some(5), .. }));

        let row_error: StreamEvent = serde_json::from_value(
            json!({"type": "error", "row": 3, "total": 5, "message": "Görsel indirilemedi"}),
        )
        .unwrap();
        assert!(!row_error.is_fatal());

        let fatal: StreamEvent =
            serde_json::from_value(json!({"type": "error", "message": "Excel hatası"})).unwrap();
        assert!(fatal.is_fatal());
    }

    #[test]
    fn test_unknown_event_type_tolerated() {
        let event: StreamEvent =
            serde_json::from_value(json!({"type": "heartbeat", "message": "ping"})).unwrap();
        assert!(matches!(event, StreamEvent::Other));
    }
}
