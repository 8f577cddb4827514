// file: src/models/job.rs
// description: client-side job state machine for asynchronous pipeline work
// reference: internal data structures

use crate::error::{ClientError, Result};
use crate::models::record::{BatchSummary, RecordResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How completion of the job is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Single request/response.
    Sync,
    /// Submit, then repeatedly query a status endpoint.
    Poll,
    /// Submit, then read an incrementally delivered event stream.
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Submitting,
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
}

impl Progress {
    pub fn new(current: u64, total: u64) -> Self {
        Self { current, total }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.current as f64 / self.total as f64) * 100.0
    }
}

/// One client-initiated unit of work against a pipeline service.
///
/// A job is created `Idle`, moves through `Submitting` and (for poll/stream
/// jobs) `InProgress`, and ends in exactly one of `Completed` or `Failed`.
/// Terminal states are final; a retry is always a fresh `Job`, never a
/// resumed one.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    state: JobState,
    task_id: Option<String>,
    progress: Option<Progress>,
    result_rows: Vec<RecordResult>,
    summary: Option<BatchSummary>,
    error: Option<String>,
}

impl Job {
    pub fn new(kind: JobKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            state: JobState::Idle,
            task_id: None,
            progress: None,
            result_rows: Vec::new(),
            summary: None,
            error: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    /// Populated only once the job has completed.
    pub fn result_rows(&self) -> &[RecordResult] {
        &self.result_rows
    }

    pub fn summary(&self) -> Option<&BatchSummary> {
        self.summary.as_ref()
    }

    /// Populated only when the job has failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_submit(&mut self) -> Result<()> {
        if self.state != JobState::Idle {
            return Err(ClientError::Validation(format!(
                "job {} cannot be submitted from state {:?}",
                self.id, self.state
            )));
        }
        self.state = JobState::Submitting;
        Ok(())
    }

    /// Marks the job as tracked remotely, optionally recording the ticket id
    /// handed back by the service.
    pub fn start_tracking(&mut self, task_id: Option<String>) -> Result<()> {
        if self.state != JobState::Submitting {
            return Err(ClientError::Validation(format!(
                "job {} cannot start tracking from state {:?}",
                self.id, self.state
            )));
        }
        self.task_id = task_id;
        self.state = JobState::InProgress;
        Ok(())
    }

    /// Progress updates are applied in receipt order and only while the job
    /// is in flight; late updates after a terminal state are dropped.
    pub fn update_progress(&mut self, progress: Progress) {
        if self.state == JobState::InProgress {
            self.progress = Some(progress);
        }
    }

    pub fn complete(&mut self, rows: Vec<RecordResult>, summary: Option<BatchSummary>) -> Result<()> {
        self.ensure_live()?;
        self.result_rows = rows;
        self.summary = summary;
        self.progress = None;
        self.state = JobState::Completed;
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.ensure_live()?;
        self.error = Some(message.into());
        self.progress = None;
        self.state = JobState::Failed;
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(ClientError::Validation(format!(
                "job {} is already terminal ({:?})",
                self.id, self.state
            )));
        }
        if self.state == JobState::Idle {
            return Err(ClientError::Validation(format!(
                "job {} was never submitted",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_happy_path() {
        let mut job = Job::new(JobKind::Poll);
        assert_eq!(job.state(), JobState::Idle);

        job.begin_submit().unwrap();
        job.start_tracking(Some("abc-123".to_string())).unwrap();
        assert_eq!(job.state(), JobState::InProgress);
        assert_eq!(job.task_id(), Some("abc-123"));

        job.update_progress(Progress::new(50, 100));
        assert_eq!(job.progress().unwrap().percent(), 50.0);

        job.complete(vec![], None).unwrap();
        assert_eq!(job.state(), JobState::Completed);
        assert!(job.progress().is_none());
        assert!(job.error().is_none());
    }

    #[test]
    fn test_sync_job_skips_in_progress() {
        let mut job = Job::new(JobKind::Sync);
        job.begin_submit().unwrap();
        job.complete(vec![], None).unwrap();
        assert_eq!(job.state(), JobState::Completed);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut job = Job::new(JobKind::Stream);
        job.begin_submit().unwrap();
        job.fail("connection ended unexpectedly").unwrap();

        assert_eq!(job.state(), JobState::Failed);
        assert_eq!(job.error(), Some("connection ended unexpectedly"));
        assert!(job.complete(vec![], None).is_err());
        assert!(job.fail("again").is_err());
        assert_eq!(job.state(), JobState::Failed);
    }

    #[test]
    fn test_idle_job_cannot_finish() {
        let mut job = Job::new(JobKind::Sync);
        assert!(job.complete(vec![], None).is_err());
        assert!(job.fail("nope").is_err());
        assert_eq!(job.state(), JobState::Idle);
    }

    #[test]
    fn test_double_submit_rejected() {
        let mut job = Job::new(JobKind::Sync);
        job.begin_submit().unwrap();
        assert!(job.begin_submit().is_err());
    }

    #[test]
    fn test_late_progress_update_dropped() {
        let mut job = Job::new(JobKind::Poll);
        job.begin_submit().unwrap();
        job.start_tracking(None).unwrap();
        job.complete(vec![], None).unwrap();

        job.update_progress(Progress::new(1, 2));
        assert!(job.progress().is_none());
    }

    #[test]
    fn test_progress_percent_zero_total() {
        assert_eq!(Progress::new(5, 0).percent(), 0.0);
    }
}
