// file: src/pipeline/orchestrator.rs
// description: coordinates submission, tracking, aggregation, and download
// reference: orchestrates the submit -> track -> aggregate workflow

use crate::aggregate;
use crate::client::http::{PipelineClient, Submission};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::job::{Job, JobKind};
use crate::models::wire::RemoteTaskStatus;
use crate::pipeline::progress::ConsoleProgress;
use crate::request::builder::{FileCategory, RequestBuilder};
use crate::tracker::cancel::CancelToken;
use crate::tracker::poller::StatusPoller;
use crate::tracker::sse::{StreamEnd, StreamReader};
use crate::utils::validation::Validator;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which OCR service backs an image pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrEngine {
    Deepseek,
    Hunyuan,
}

/// How an immediate (synchronous) response body is aggregated.
enum ImmediateShape {
    Ocr,
    RecordArray,
    Batch,
}

/// Runs one job per invocation: every call creates a fresh [`Job`]; a failed
/// job is never resumed. Submission errors after validation are captured in
/// the returned job's terminal state rather than bubbling up, so the caller
/// can render them inline.
pub struct JobRunner {
    config: Config,
    client: PipelineClient,
}

impl JobRunner {
    pub fn new(config: Config) -> Result<Self> {
        let client = PipelineClient::new(config.client.request_timeout_secs)?;
        Ok(Self { config, client })
    }

    pub fn client(&self) -> &PipelineClient {
        &self.client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Single-image OCR: synchronous request/response.
    pub async fn run_ocr(&self, image: &Path, engine: OcrEngine) -> Result<Job> {
        let request = RequestBuilder::new(FileCategory::Image).file(image).build()?;

        let base = match engine {
            OcrEngine::Deepseek => &self.config.services.ocr_base_url,
            OcrEngine::Hunyuan => &self.config.services.hunyuan_ocr_base_url,
        };
        let url = format!("{}/api/v1/ocr", base.trim_end_matches('/'));

        let mut job = Job::new(JobKind::Sync);
        job.begin_submit()?;

        match self.client.submit(&url, request.into_form().await?).await {
            Ok(Submission::Immediate(body)) => {
                self.finish_immediate(&mut job, body, ImmediateShape::Ocr)?
            }
            Ok(other) => Self::fail_unexpected(&mut job, &other)?,
            Err(e) => Self::fail_submit(&mut job, e)?,
        }
        Ok(job)
    }

    /// Bankruptcy-notice extraction: one flat record per uploaded image.
    pub async fn run_iflas(
        &self,
        images: &[PathBuf],
        api_key: Option<String>,
        engine: OcrEngine,
    ) -> Result<Job> {
        let mut builder = RequestBuilder::new(FileCategory::Image)
            .api_key(api_key)
            .require_api_key()
            .param(
                "ocr_service",
                match engine {
                    OcrEngine::Deepseek => "deepseek",
                    OcrEngine::Hunyuan => "hunyuan",
                },
            );
        for image in images {
            builder = builder.file(image);
        }
        let request = builder.build()?;

        let url = format!(
            "{}/api/v1/pipelines/iflas-ocr",
            self.config.services.iflas_base_url.trim_end_matches('/')
        );

        let mut job = Job::new(JobKind::Sync);
        job.begin_submit()?;

        match self.client.submit(&url, request.into_form().await?).await {
            Ok(Submission::Immediate(body)) => {
                self.finish_immediate(&mut job, body, ImmediateShape::RecordArray)?
            }
            Ok(other) => Self::fail_unexpected(&mut job, &other)?,
            Err(e) => Self::fail_submit(&mut job, e)?,
        }
        Ok(job)
    }

    /// Spreadsheet batch extraction: synchronous batch summary response.
    pub async fn run_kunye_batch(
        &self,
        sheet: &Path,
        api_key: Option<String>,
        clip_id_column: &str,
    ) -> Result<Job> {
        let request = RequestBuilder::new(FileCategory::Spreadsheet)
            .file(sheet)
            .api_key(api_key)
            .require_api_key()
            .file_field("file")
            .param("clip_id_column", clip_id_column)
            .build()?;

        let url = format!(
            "{}/api/v1/pipelines/mbr-kunye-batch",
            self.config.services.kunye_base_url.trim_end_matches('/')
        );

        let mut job = Job::new(JobKind::Sync);
        job.begin_submit()?;

        match self.client.submit(&url, request.into_form().await?).await {
            Ok(Submission::Immediate(body)) => {
                self.finish_immediate(&mut job, body, ImmediateShape::Batch)?
            }
            Ok(other) => Self::fail_unexpected(&mut job, &other)?,
            Err(e) => Self::fail_submit(&mut job, e)?,
        }
        Ok(job)
    }

    /// Audio source separation: ticketed submission tracked by polling, with
    /// the separated tracks downloaded once the task completes.
    pub async fn run_audio_separation(
        &self,
        audio: &Path,
        prompt: &str,
        output_dir: &Path,
        cancel: CancelToken,
        progress: &ConsoleProgress,
    ) -> Result<(Job, Vec<PathBuf>)> {
        Validator::validate_not_blank(prompt, "prompt")?;

        let request = RequestBuilder::new(FileCategory::Audio)
            .file(audio)
            .max_upload_mb(self.config.client.max_audio_upload_mb)
            .file_field("file")
            .param("prompt", prompt)
            .build()?;

        let base = self.config.services.audio_base_url.trim_end_matches('/');
        let url = format!("{}/api/v1/pipelines/sam-audio/separate", base);

        let mut job = Job::new(JobKind::Poll);
        job.begin_submit()?;

        let ticket = match self.client.submit(&url, request.into_form().await?).await {
            Ok(Submission::Ticket(ticket)) => ticket,
            Ok(other) => {
                Self::fail_unexpected(&mut job, &other)?;
                return Ok((job, Vec::new()));
            }
            Err(e) => {
                Self::fail_submit(&mut job, e)?;
                return Ok((job, Vec::new()));
            }
        };

        info!("Task {} accepted, polling for completion", ticket.task_id);
        job.start_tracking(Some(ticket.task_id.clone()))?;

        let status_url = format!("{}/api/v1/pipelines/sam-audio/status/{}", base, ticket.task_id);
        let poller = StatusPoller::new(&self.client, self.config.client.poll_interval_secs);

        let end = match poller
            .run(&mut job, &status_url, cancel, |status| progress.on_status(status))
            .await
        {
            Ok(end) => end,
            Err(e) => {
                job.fail(e.to_string())?;
                return Ok((job, Vec::new()));
            }
        };

        let Some(status) = end else {
            // Cancelled; the job is torn down without a terminal transition.
            return Ok((job, Vec::new()));
        };

        if status.is_failed() {
            let message = status
                .error
                .clone()
                .or_else(|| status.message.clone())
                .unwrap_or_else(|| "task failed".to_string());
            job.fail(message)?;
            return Ok((job, Vec::new()));
        }

        let record = aggregate::from_task_status(&status, &audio.display().to_string());
        job.complete(vec![record], None)?;

        // The separation itself succeeded; a failed download must not undo it.
        let downloaded = self.download_tracks(&status, base, output_dir).await;
        Ok((job, downloaded))
    }

    /// Kunye web batch: a spreadsheet of publication names and links is
    /// processed row by row, with per-row events streamed over the open
    /// submission response and a batch summary in the final `complete` event.
    pub async fn run_kunye_web_stream(
        &self,
        sheet: &Path,
        api_key: Option<String>,
        yayin_column: &str,
        link_column: &str,
        cancel: CancelToken,
        progress: &ConsoleProgress,
    ) -> Result<Job> {
        let request = RequestBuilder::new(FileCategory::Spreadsheet)
            .file(sheet)
            .api_key(api_key)
            .require_api_key()
            .file_field("file")
            .param("yayin_column", yayin_column)
            .param("link_column", link_column)
            .build()?;

        let url = format!(
            "{}/api/v1/pipelines/mbr-kunye-web-batch-stream",
            self.config.services.kunye_web_base_url.trim_end_matches('/')
        );

        let mut job = Job::new(JobKind::Stream);
        job.begin_submit()?;

        let response = match self.client.submit(&url, request.into_form().await?).await {
            Ok(Submission::Stream(response)) => response,
            Ok(other) => {
                Self::fail_unexpected(&mut job, &other)?;
                return Ok(job);
            }
            Err(e) => {
                Self::fail_submit(&mut job, e)?;
                return Ok(job);
            }
        };

        job.start_tracking(None)?;

        let end =
            StreamReader::run(response, &mut job, cancel, |event| progress.on_event(event)).await?;

        match end {
            StreamEnd::Completed(event) => {
                let (summary, rows) = aggregate::from_complete_event(event)?;
                job.complete(rows, summary)?;
            }
            StreamEnd::Failed(message) => {
                warn!("Stream ended without completing: {}", message);
                job.fail(message)?;
            }
            StreamEnd::Cancelled => {}
        }
        Ok(job)
    }

    /// Radio news analysis: the submission response itself streams events.
    pub async fn run_radio_stream(
        &self,
        audio: &Path,
        api_key: Option<String>,
        cancel: CancelToken,
        progress: &ConsoleProgress,
    ) -> Result<Job> {
        let request = RequestBuilder::new(FileCategory::Audio)
            .file(audio)
            .max_upload_mb(self.config.client.max_audio_upload_mb)
            .api_key(api_key)
            .require_api_key()
            .file_field("file")
            .build()?;

        let url = format!(
            "{}/api/v1/pipelines/radyo-news-stream",
            self.config.services.radio_base_url.trim_end_matches('/')
        );

        let mut job = Job::new(JobKind::Stream);
        job.begin_submit()?;

        let response = match self.client.submit(&url, request.into_form().await?).await {
            Ok(Submission::Stream(response)) => response,
            Ok(other) => {
                Self::fail_unexpected(&mut job, &other)?;
                return Ok(job);
            }
            Err(e) => {
                Self::fail_submit(&mut job, e)?;
                return Ok(job);
            }
        };

        job.start_tracking(None)?;

        let end =
            StreamReader::run(response, &mut job, cancel, |event| progress.on_event(event)).await?;

        match end {
            StreamEnd::Completed(event) => {
                let (summary, rows) = aggregate::from_complete_event(event)?;
                job.complete(rows, summary)?;
            }
            StreamEnd::Failed(message) => {
                warn!("Stream ended without completing: {}", message);
                job.fail(message)?;
            }
            StreamEnd::Cancelled => {}
        }
        Ok(job)
    }

    fn finish_immediate(&self, job: &mut Job, body: Value, shape: ImmediateShape) -> Result<()> {
        match shape {
            ImmediateShape::Ocr => {
                let items = serde_json::from_value::<crate::models::wire::OcrResponse>(body)?
                    .into_items();
                job.complete(aggregate::from_ocr(items), None)
            }
            ImmediateShape::RecordArray => {
                let rows = aggregate::from_record_array(body)?;
                job.complete(rows, None)
            }
            ImmediateShape::Batch => {
                let response = serde_json::from_value(body)?;
                let (summary, rows) = aggregate::from_batch(response);
                job.complete(rows, Some(summary))
            }
        }
    }

    fn fail_submit(job: &mut Job, error: ClientError) -> Result<()> {
        warn!("Submission failed: {}", error);
        job.fail(error.to_string())
    }

    fn fail_unexpected(job: &mut Job, submission: &Submission) -> Result<()> {
        let shape = match submission {
            Submission::Immediate(_) => "an immediate result",
            Submission::Ticket(_) => "an async ticket",
            Submission::Stream(_) => "an event stream",
        };
        job.fail(format!("service answered with {} where none was expected", shape))
    }

    /// Fetches every reported track, skipping the ones that fail so a single
    /// bad download still leaves the rest on disk.
    async fn download_tracks(
        &self,
        status: &RemoteTaskStatus,
        base: &str,
        output_dir: &Path,
    ) -> Vec<PathBuf> {
        let Some(downloads) = &status.downloads else {
            return Vec::new();
        };

        let mut paths = Vec::new();
        for (track, path) in downloads {
            let url = if path.starts_with("http://") || path.starts_with("https://") {
                path.clone()
            } else {
                format!("{}{}", base, path)
            };
            let dest = output_dir.join(format!("{}.wav", track));
            match self.client.download(&url, &dest).await {
                Ok(_) => paths.push(dest),
                Err(e) => warn!("Could not download {} track: {}", track, e),
            }
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_runner_creation() {
        let runner = JobRunner::new(Config::default_config()).unwrap();
        assert_eq!(runner.config().client.poll_interval_secs, 2);
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_job() {
        let runner = JobRunner::new(Config::default_config()).unwrap();

        // No such file: the builder rejects before any network call, so the
        // error surfaces directly instead of a failed job.
        let result = runner
            .run_ocr(Path::new("/nonexistent/scan.jpg"), OcrEngine::Deepseek)
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_credential_blocks_submission() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("show.mp3");
        std::fs::write(&audio, b"mp3").unwrap();

        let runner = JobRunner::new(Config::default_config()).unwrap();
        let (_, cancel) = crate::tracker::cancel::cancel_pair();
        let progress = ConsoleProgress::with_color(false);

        let result = runner
            .run_radio_stream(&audio, Some("   ".to_string()), cancel, &progress)
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_kunye_web_requires_credential() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("yayinlar.xlsx");
        std::fs::write(&sheet, b"xlsx").unwrap();

        let runner = JobRunner::new(Config::default_config()).unwrap();
        let (_, cancel) = crate::tracker::cancel::cancel_pair();
        let progress = ConsoleProgress::with_color(false);

        let result = runner
            .run_kunye_web_stream(&sheet, None, "A", "B", cancel, &progress)
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_prompt_blocks_separation() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("show.mp3");
        std::fs::write(&audio, b"mp3").unwrap();

        let runner = JobRunner::new(Config::default_config()).unwrap();
        let (_, cancel) = crate::tracker::cancel::cancel_pair();
        let progress = ConsoleProgress::with_color(false);

        let result = runner
            .run_audio_separation(&audio, "  ", dir.path(), cancel, &progress)
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_track_download_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let runner = JobRunner::new(Config::default_config()).unwrap();

        // Unreachable host: every download fails, none of them bubble up
        let status: RemoteTaskStatus = serde_json::from_value(serde_json::json!({
            "status": "completed",
            "downloads": {"isolated": "/download/t1/isolated"}
        }))
        .unwrap();

        let paths = runner
            .download_tracks(&status, "http://127.0.0.1:9", dir.path())
            .await;
        assert!(paths.is_empty());
    }
}
