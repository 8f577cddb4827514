// file: src/client/mod.rs
// description: HTTP submission layer for the pipeline services

pub mod envelope;
pub mod http;

pub use envelope::{classify_body, error_detail, SubmissionBody};
pub use http::{PipelineClient, Submission};
