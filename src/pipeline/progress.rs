// file: src/pipeline/progress.rs
// description: progress display and statistics reporting for job runs
// reference: uses indicatif for progress bars and tracks processing metrics

use crate::models::wire::{RemoteTaskStatus, StreamEvent};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub records_succeeded: usize,
    pub records_failed: usize,
    pub duration_secs: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.records_succeeded + self.records_failed;
        if total == 0 {
            return 0.0;
        }
        (self.records_succeeded as f64 / total as f64) * 100.0
    }
}

/// Console progress for one job run: a main bar tracking item position and a
/// detail line echoing the latest service message.
pub struct ConsoleProgress {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    start_time: Instant,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::with_color(true)
    }

    pub fn with_color(colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn set_total(&self, total: u64) {
        self.main_bar.set_length(total);
    }

    pub fn set_position(&self, position: u64) {
        self.main_bar.set_position(position);
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn inc_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.update_detail_bar();
    }

    /// Renders one poll response.
    pub fn on_status(&self, status: &RemoteTaskStatus) {
        if let (Some(progress), Some(total)) = (status.progress, status.total) {
            self.set_total(total);
            self.set_position(progress);
        }
        if let Some(message) = &status.message {
            self.detail_bar.set_message(message.clone());
        }
    }

    /// Renders one decoded stream event.
    pub fn on_event(&self, event: &StreamEvent) {
        match event {
            StreamEvent::Init { total, message } => {
                if let Some(total) = total {
                    self.set_total(*total);
                }
                if let Some(message) = message {
                    self.detail_bar.set_message(message.clone());
                }
            }
            StreamEvent::Progress { row, total, message, .. } => {
                if let (Some(row), Some(total)) = (row, total) {
                    self.set_total(*total);
                    self.set_position(*row);
                }
                if let Some(message) = message {
                    self.detail_bar.set_message(message.clone());
                }
            }
            StreamEvent::Success { row, total, .. } => {
                if let (Some(row), Some(total)) = (row, total) {
                    self.set_total(*total);
                    self.set_position(*row);
                }
                self.inc_succeeded();
            }
            StreamEvent::Error { row, .. } => {
                if row.is_some() {
                    self.inc_failed();
                }
            }
            StreamEvent::NewsFound { message, .. } => {
                if let Some(message) = message {
                    self.detail_bar.set_message(message.clone());
                }
            }
            StreamEvent::Complete { .. } | StreamEvent::Other => {}
        }
    }

    pub fn finish(&self) {
        self.main_bar.finish_and_clear();
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> RunStats {
        RunStats {
            records_succeeded: self.succeeded.load(Ordering::SeqCst),
            records_failed: self.failed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let succeeded = self.succeeded.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        self.detail_bar
            .set_message(format!("Succeeded: {} | Failed: {}", succeeded, failed));
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::no_length());
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::no_length());
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_stats_success_rate() {
        let mut stats = RunStats::new();
        stats.records_succeeded = 9;
        stats.records_failed = 1;
        assert_eq!(stats.success_rate(), 90.0);
    }

    #[test]
    fn test_run_stats_empty() {
        assert_eq!(RunStats::new().success_rate(), 0.0);
    }

    #[test]
    fn test_stream_events_drive_counters() {
        let progress = ConsoleProgress::with_color(false);

        let success: StreamEvent =
            serde_json::from_value(json!({"type": "success", "row": 1, "total": 3})).unwrap();
        let row_error: StreamEvent =
            serde_json::from_value(json!({"type": "error", "row": 2, "total": 3, "message": "x"}))
                .unwrap();
        let fatal: StreamEvent =
            serde_json::from_value(json!({"type": "error", "message": "fatal"})).unwrap();

        progress.on_event(&success);
        progress.on_event(&row_error);
        // Fatal errors are not per-record outcomes
        progress.on_event(&fatal);

        let stats = progress.get_stats();
        assert_eq!(stats.records_succeeded, 1);
        assert_eq!(stats.records_failed, 1);
    }

    #[test]
    fn test_poll_status_updates_bar() {
        let progress = ConsoleProgress::with_color(false);
        let status: RemoteTaskStatus = serde_json::from_value(
            json!({"status": "processing", "progress": 40, "total": 100, "message": "Separating"}),
        )
        .unwrap();

        progress.on_status(&status);
        let stats = progress.get_stats();
        assert_eq!(stats.records_succeeded, 0);
    }
}
