// file: src/client/envelope.rs
// description: error envelope parsing and submission response classification
// reference: MTM pipeline service HTTP APIs

use crate::models::wire::TaskTicket;
use crate::utils::validation::Validator;
use reqwest::StatusCode;
use serde_json::Value;

const BODY_SNIPPET_LEN: usize = 200;

/// Human-readable detail for a non-2xx response. Services send
/// `{"detail": "..."}`; anything else falls back to the status line plus a
/// truncated snippet of the raw body.
pub fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }

    let reason = status.canonical_reason().unwrap_or("Unknown");
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("{} {}", status.as_u16(), reason)
    } else {
        format!(
            "{} {}: {}",
            status.as_u16(),
            reason,
            Validator::truncate_text(trimmed, BODY_SNIPPET_LEN)
        )
    }
}

/// A successful JSON submission body is either an async ticket or the result
/// itself. Resolved exactly once, at submission time.
#[derive(Debug, Clone)]
pub enum SubmissionBody {
    Ticket(TaskTicket),
    Immediate(Value),
}

pub fn classify_body(value: Value) -> SubmissionBody {
    if value.get("task_id").is_some() {
        if let Ok(ticket) = serde_json::from_value::<TaskTicket>(value.clone()) {
            return SubmissionBody::Ticket(ticket);
        }
    }
    SubmissionBody::Immediate(value)
}
