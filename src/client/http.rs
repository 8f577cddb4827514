// file: src/client/http.rs
// description: reqwest wrapper issuing submissions, status polls, and downloads
// reference: https://docs.rs/reqwest

use crate::client::envelope::{classify_body, error_detail, SubmissionBody};
use crate::error::{ClientError, Result};
use crate::models::wire::{RemoteTaskStatus, TaskTicket};
use futures::StreamExt;
use reqwest::multipart::Form;
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Outcome of one submission POST, resolved once from the response itself.
#[derive(Debug)]
pub enum Submission {
    /// The service answered with the result body directly.
    Immediate(Value),
    /// The service handed back a ticket to poll.
    Ticket(TaskTicket),
    /// The service is streaming framed events over this open response.
    Stream(reqwest::Response),
}

pub struct PipelineClient {
    http: Client,
    request_timeout: Duration,
}

impl PipelineClient {
    /// The timeout applies to short requests (status polls, health probes);
    /// submissions and downloads run unbounded since jobs are long-lived and
    /// the service is trusted to emit a terminal event.
    pub fn new(request_timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Issues the single submission POST and classifies the response shape.
    pub async fn submit(&self, url: &str, form: Form) -> Result<Submission> {
        info!("Submitting job to {}", url);
        let response = self.http.post(url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("text/event-stream") {
            debug!("Submission answered with an event stream");
            return Ok(Submission::Stream(response));
        }

        let body: Value = response.json().await?;
        Ok(match classify_body(body) {
            SubmissionBody::Ticket(ticket) => {
                debug!("Submission answered with ticket {}", ticket.task_id);
                Submission::Ticket(ticket)
            }
            SubmissionBody::Immediate(value) => Submission::Immediate(value),
        })
    }

    /// One poll of `GET {base}/status/{task_id}`.
    pub async fn task_status(&self, status_url: &str) -> Result<RemoteTaskStatus> {
        let response = self
            .http
            .get(status_url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }

        Ok(response.json().await?)
    }

    /// Streams a derived artifact to disk, returning the bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {} -> {}", url, dest.display());
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ClientError::FileOperation {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut file =
            tokio::fs::File::create(dest)
                .await
                .map_err(|source| ClientError::FileOperation {
                    path: dest.to_path_buf(),
                    source,
                })?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            file.write_all(&bytes)
                .await
                .map_err(|source| ClientError::FileOperation {
                    path: dest.to_path_buf(),
                    source,
                })?;
            written += bytes.len() as u64;
        }
        file.flush()
            .await
            .map_err(|source| ClientError::FileOperation {
                path: dest.to_path_buf(),
                source,
            })?;

        debug!("Downloaded {} bytes", written);
        Ok(written)
    }

    /// `GET {base}/health` probe.
    pub async fn health(&self, base_url: &str) -> Result<Value> {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }

        Ok(response.json().await?)
    }
}
