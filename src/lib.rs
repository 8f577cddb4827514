// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod exporter;
pub mod models;
pub mod pipeline;
pub mod request;
pub mod tracker;
pub mod utils;

pub use client::{PipelineClient, Submission};
pub use config::{ClientConfig, Config, ExportConfig, ServicesConfig};
pub use error::{ClientError, Result};
pub use exporter::{JsonExporter, ResultTable, XlsxExporter};
pub use models::{
    BatchSummary, Job, JobKind, JobState, Person, Progress, RecordResult, RecordStatus,
};
pub use pipeline::{ConsoleProgress, JobRunner, RunStats};
pub use request::{FileCategory, JobRequest, RequestBuilder};
pub use tracker::{cancel_pair, CancelHandle, CancelToken, SseDecoder, StatusPoller, StreamReader};
pub use utils::Validator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _config = Config::default_config();
        let _job = Job::new(JobKind::Sync);
    }
}
