// file: src/tracker/poller.rs
// description: fixed-interval status polling for ticketed jobs
// reference: tokio interval timers

use crate::client::http::PipelineClient;
use crate::error::Result;
use crate::models::job::{Job, Progress};
use crate::models::wire::RemoteTaskStatus;
use crate::tracker::cancel::CancelToken;
use std::time::Duration;
use tracing::{debug, warn};

/// Polls `GET .../status/{task_id}` on a fixed interval until the remote
/// status is terminal. The first poll fires immediately; no further request
/// is issued once a terminal status has been seen or the token is cancelled.
pub struct StatusPoller<'a> {
    client: &'a PipelineClient,
    interval: Duration,
}

/// Outcome of a poll loop: the terminal status, or `None` when cancelled.
pub type PollEnd = Option<RemoteTaskStatus>;

impl<'a> StatusPoller<'a> {
    pub fn new(client: &'a PipelineClient, interval_secs: u64) -> Self {
        Self {
            client,
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub async fn run(
        &self,
        job: &mut Job,
        status_url: &str,
        mut cancel: CancelToken,
        mut on_tick: impl FnMut(&RemoteTaskStatus),
    ) -> Result<PollEnd> {
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => {
                    debug!("Status poller cancelled");
                    return Ok(None);
                }
            }

            let status = match self.client.task_status(status_url).await {
                Ok(status) => status,
                // A service-reported error (404 lost ticket, 500) is fatal;
                // a transport blip is not, the next tick retries.
                Err(e) if e.is_remote() => return Err(e),
                Err(e) => {
                    warn!("Status poll failed, will retry: {}", e);
                    continue;
                }
            };

            Self::apply(job, &status);
            on_tick(&status);

            if status.is_terminal() {
                debug!("Task reached terminal status: {}", status.status);
                return Ok(Some(status));
            }
        }
    }

    fn apply(job: &mut Job, status: &RemoteTaskStatus) {
        if let (Some(progress), Some(total)) = (status.progress, status.total) {
            job.update_progress(Progress::new(progress, total));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{JobKind, JobState};
    use serde_json::json;

    fn in_progress_job() -> Job {
        let mut job = Job::new(JobKind::Poll);
        job.begin_submit().unwrap();
        job.start_tracking(Some("t-1".to_string())).unwrap();
        job
    }

    #[test]
    fn test_apply_updates_progress() {
        let mut job = in_progress_job();
        let status: RemoteTaskStatus =
            serde_json::from_value(json!({"status": "processing", "progress": 40, "total": 100}))
                .unwrap();

        StatusPoller::apply(&mut job, &status);
        assert_eq!(job.progress(), Some(Progress::new(40, 100)));
        assert_eq!(job.state(), JobState::InProgress);
    }

    #[test]
    fn test_apply_without_progress_fields_is_noop() {
        let mut job = in_progress_job();
        let status: RemoteTaskStatus =
            serde_json::from_value(json!({"status": "pending"})).unwrap();

        StatusPoller::apply(&mut job, &status);
        assert!(job.progress().is_none());
    }
}
