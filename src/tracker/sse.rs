// file: src/tracker/sse.rs
// description: incremental decoding of server-sent event streams
// reference: text/event-stream framing used by the streaming pipelines

use crate::error::Result;
use crate::models::job::{Job, Progress};
use crate::models::wire::StreamEvent;
use crate::tracker::cancel::CancelToken;
use futures::StreamExt;
use tracing::{debug, warn};

const EVENT_PREFIX: &str = "data:";

/// Reassembles `data: {json}` frames from arbitrarily chunked bytes. Frames
/// can split anywhere, including inside a multi-byte character, so the buffer
/// is kept as raw bytes and lines are decoded only once complete.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every complete event payload it closed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(&['\n', '\r'][..]);

            if let Some(payload) = line.strip_prefix(EVENT_PREFIX) {
                let payload = payload.trim_start();
                if !payload.is_empty() {
                    payloads.push(payload.to_string());
                }
            } else if !line.trim().is_empty() {
                debug!("Ignoring non-event stream line: {}", line);
            }
        }
        payloads
    }

    /// Parses one payload. Malformed payloads are logged and skipped; they
    /// never fail the job.
    pub fn parse_event(payload: &str) -> Option<StreamEvent> {
        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping malformed stream event ({}): {}", e, payload);
                None
            }
        }
    }
}

/// How a streamed job ended.
#[derive(Debug)]
pub enum StreamEnd {
    /// A `complete` event arrived; carries the full event payload.
    Completed(StreamEvent),
    /// A fatal `error` event arrived, or the connection closed early.
    Failed(String),
    Cancelled,
}

/// Consumes an open event-stream response until a terminal event, connection
/// close, or cancellation. Progress events update the job in receipt order;
/// every decoded event is also handed to `on_event` for display.
pub struct StreamReader;

impl StreamReader {
    pub async fn run(
        response: reqwest::Response,
        job: &mut Job,
        mut cancel: CancelToken,
        mut on_event: impl FnMut(&StreamEvent),
    ) -> Result<StreamEnd> {
        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();

        loop {
            let chunk = tokio::select! {
                chunk = stream.next() => chunk,
                _ = cancel.cancelled() => {
                    debug!("Stream reader cancelled");
                    return Ok(StreamEnd::Cancelled);
                }
            };

            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    warn!("Stream connection error: {}", e);
                    return Ok(StreamEnd::Failed(format!(
                        "connection ended unexpectedly: {}",
                        e
                    )));
                }
                // Connection closed without a terminal event: the job must
                // not hang in progress or silently complete.
                None => {
                    return Ok(StreamEnd::Failed(
                        "connection ended unexpectedly".to_string(),
                    ));
                }
            };

            for payload in decoder.push(&bytes) {
                let Some(event) = SseDecoder::parse_event(&payload) else {
                    continue;
                };
                on_event(&event);

                match &event {
                    StreamEvent::Init { total, .. } => {
                        if let Some(total) = total {
                            job.update_progress(Progress::new(0, *total));
                        }
                    }
                    StreamEvent::Progress { row, total, .. }
                    | StreamEvent::Success { row, total, .. } => {
                        if let (Some(row), Some(total)) = (row, total) {
                            job.update_progress(Progress::new(*row, *total));
                        }
                    }
                    StreamEvent::Error { row, total, message } => {
                        if event.is_fatal() {
                            return Ok(StreamEnd::Failed(message.clone()));
                        }
                        // Per-record failure: the batch keeps going.
                        if let (Some(row), Some(total)) = (row, total) {
                            job.update_progress(Progress::new(*row, *total));
                        }
                    }
                    StreamEvent::Complete { .. } => {
                        return Ok(StreamEnd::Completed(event));
                    }
                    StreamEvent::NewsFound { .. } | StreamEvent::Other => {}
                }
            }
        }
    }
}
