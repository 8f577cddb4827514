// file: src/aggregate/mod.rs
// description: normalizes terminal job payloads into record results and summaries
// reference: MTM pipeline service response shapes

use crate::error::{ClientError, Result};
use crate::models::record::{BatchSummary, RecordResult};
use crate::models::wire::{BatchRecord, BatchResponse, OcrItem, RemoteTaskStatus, StreamEvent};
use serde_json::{Map, Value};
use tracing::debug;

/// Batch payloads carry authoritative counters; they are passed through
/// untouched, never recomputed from the rows.
pub fn from_batch(response: BatchResponse) -> (BatchSummary, Vec<RecordResult>) {
    let summary = BatchSummary {
        total: response.total,
        processed: response.processed,
        successful: response.successful,
        failed: response.failed,
    };

    let rows = response.results.into_iter().map(record_from_batch).collect();
    (summary, rows)
}

fn record_from_batch(record: BatchRecord) -> RecordResult {
    let source_id = record.clip_id.unwrap_or_default();

    let result = if record.status == "success" {
        let fields = match record.data {
            Some(Value::Object(map)) => prune_nulls(map),
            _ => Map::new(),
        };
        RecordResult::success(record.row, source_id, fields)
    } else {
        RecordResult::error(
            record.row,
            source_id,
            record.error.unwrap_or_else(|| "unknown error".to_string()),
        )
    };

    result.with_raw_text(record.raw_ocr_text)
}

/// A `complete` stream event carries either batch-style rows (kunye web) or
/// a single result object (radio analysis).
pub fn from_complete_event(event: StreamEvent) -> Result<(Option<BatchSummary>, Vec<RecordResult>)> {
    let StreamEvent::Complete {
        total,
        processed,
        successful,
        failed,
        results,
        result,
        ..
    } = event
    else {
        return Err(ClientError::Stream(
            "aggregation requires a complete event".to_string(),
        ));
    };

    if let Some(results) = results {
        let records: Vec<BatchRecord> = serde_json::from_value(results)?;
        let summary = match (total, processed, successful, failed) {
            (Some(total), Some(processed), Some(successful), Some(failed)) => Some(BatchSummary {
                total,
                processed,
                successful,
                failed,
            }),
            _ => None,
        };
        let rows = records.into_iter().map(record_from_batch).collect();
        return Ok((summary, rows));
    }

    if let Some(result) = result {
        return Ok((None, vec![from_single(result, "1")]));
    }

    debug!("Complete event carried no payload");
    Ok((None, Vec::new()))
}

/// One flat extracted record (single-item endpoints). `raw_ocr_text` is
/// lifted out of the field map into the audit slot.
pub fn from_single(value: Value, source_id: &str) -> RecordResult {
    let mut fields = match value {
        Value::Object(map) => prune_nulls(map),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };

    let raw_text = fields
        .remove("raw_ocr_text")
        .or_else(|| fields.remove("raw_transcript"))
        .and_then(|v| v.as_str().map(|s| s.to_string()));

    RecordResult::success(1, source_id, fields).with_raw_text(raw_text)
}

/// The iflas endpoint answers with one flat record per uploaded image.
pub fn from_record_array(value: Value) -> Result<Vec<RecordResult>> {
    let items: Vec<Value> = serde_json::from_value(value)?;
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let mut record = from_single(item, &format!("{}", i + 1));
            record.index = (i + 1) as u64;
            record
        })
        .collect())
}

/// OCR responses become one record per file, with the recognized text both
/// as a field and in the audit slot.
pub fn from_ocr(items: Vec<OcrItem>) -> Vec<RecordResult> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let index = (i + 1) as u64;
            let source_id = item.filename.clone().unwrap_or_else(|| index.to_string());
            let mut fields = Map::new();
            fields.insert("text".to_string(), Value::String(item.text.clone()));
            RecordResult::success(index, source_id, fields).with_raw_text(Some(item.text))
        })
        .collect()
}

/// A completed ticketed task (audio separation) yields one record whose
/// fields are the download paths reported by the status endpoint.
pub fn from_task_status(status: &RemoteTaskStatus, source_id: &str) -> RecordResult {
    let mut fields = Map::new();
    if let Some(downloads) = &status.downloads {
        for (track, path) in downloads {
            fields.insert(track.clone(), Value::String(path.clone()));
        }
    }
    if let Some(message) = &status.message {
        fields.insert("message".to_string(), Value::String(message.clone()));
    }
    RecordResult::success(1, source_id, fields)
}

fn prune_nulls(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::RecordStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_batch_counters_taken_verbatim() {
        let response: BatchResponse = serde_json::from_value(json!({
            "total": 3, "successful": 2, "failed": 1, "processed": 3,
            "results": [
                {"row": 1, "clip_id": "10293", "status": "success", "data": {"yayin_adi": "Akşam"}},
                {"row": 2, "clip_id": "10294", "status": "success", "data": {"yayin_adi": "Sabah"}},
                {"row": 3, "clip_id": "10295", "status": "error", "error": "timeout"}
            ]
        }))
        .unwrap();

        let (summary, rows) = from_batch(response);
        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                processed: 3,
                successful: 2,
                failed: 1
            }
        );
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].status, RecordStatus::Error);
        assert_eq!(rows[2].error_message.as_deref(), Some("timeout"));
        assert!(rows[2].fields.is_empty());
    }

    #[test]
    fn test_row_numbering_preserved_as_received() {
        // Excel-derived batches start at row 2 (1-indexed plus header)
        let response: BatchResponse = serde_json::from_value(json!({
            "total": 2, "successful": 2, "failed": 0, "processed": 2,
            "results": [
                {"row": 2, "clip_id": "a", "status": "success", "data": {}},
                {"row": 5, "clip_id": "b", "status": "success", "data": {}}
            ]
        }))
        .unwrap();

        let (_, rows) = from_batch(response);
        assert_eq!(rows[0].index, 2);
        assert_eq!(rows[1].index, 5);
    }

    #[test]
    fn test_complete_event_with_batch_rows() {
        let event: StreamEvent = serde_json::from_value(json!({
            "type": "complete",
            "total": 2, "processed": 2, "successful": 1, "failed": 1,
            "results": [
                {"row": 1, "yayin_adi": "Hürriyet", "status": "success",
                 "data": {"kisiler": [{"ad_soyad": "Ayşe Demir"}]}},
                {"row": 2, "yayin_adi": "Milliyet", "status": "failed", "error": "Web sayfası alınamadı"}
            ]
        }))
        .unwrap();

        let (summary, rows) = from_complete_event(event).unwrap();
        assert_eq!(summary.unwrap().failed, 1);
        assert_eq!(rows[0].source_id, "Hürriyet");
        assert_eq!(rows[0].people().len(), 1);
        assert_eq!(rows[1].status, RecordStatus::Error);
    }

    #[test]
    fn test_complete_event_with_single_result() {
        let event: StreamEvent = serde_json::from_value(json!({
            "type": "complete",
            "result": {"total_news_count": 4, "raw_transcript": "..."},
            "message": "✓ Tamamlandı!"
        }))
        .unwrap();

        let (summary, rows) = from_complete_event(event).unwrap();
        assert!(summary.is_none());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].scalar("total_news_count").as_deref(), Some("4"));
        assert_eq!(rows[0].raw_text.as_deref(), Some("..."));
    }

    #[test]
    fn test_single_record_lifts_raw_text_and_prunes_nulls() {
        let record = from_single(
            json!({
                "ad_soyad_unvan": "Örnek A.Ş.",
                "tckn": null,
                "raw_ocr_text": "İFLAS İLANI ..."
            }),
            "scan.jpg",
        );

        assert_eq!(record.raw_text.as_deref(), Some("İFLAS İLANI ..."));
        assert!(!record.fields.contains_key("tckn"));
        assert!(!record.fields.contains_key("raw_ocr_text"));
        assert_eq!(record.scalar("ad_soyad_unvan").as_deref(), Some("Örnek A.Ş."));
    }

    #[test]
    fn test_record_array_indexed_in_order() {
        let rows = from_record_array(json!([
            {"ad_soyad_unvan": "Birinci"},
            {"ad_soyad_unvan": "İkinci"}
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[1].index, 2);
    }

    #[test]
    fn test_ocr_items_become_records() {
        let rows = from_ocr(vec![
            OcrItem {
                filename: Some("a.jpg".to_string()),
                text: "ABC".to_string(),
            },
            OcrItem {
                filename: None,
                text: "DEF".to_string(),
            },
        ]);

        assert_eq!(rows[0].scalar("text").as_deref(), Some("ABC"));
        assert_eq!(rows[0].source_id, "a.jpg");
        assert_eq!(rows[1].source_id, "2");
    }

    #[test]
    fn test_task_status_downloads_become_fields() {
        let status: RemoteTaskStatus = serde_json::from_value(json!({
            "status": "completed",
            "downloads": {
                "original": "/api/v1/pipelines/sam-audio/download/t1/original",
                "isolated": "/api/v1/pipelines/sam-audio/download/t1/isolated"
            }
        }))
        .unwrap();

        let record = from_task_status(&status, "clip.mp3");
        assert_eq!(record.fields.len(), 2);
        assert!(record.scalar("isolated").unwrap().ends_with("/isolated"));
    }
}
