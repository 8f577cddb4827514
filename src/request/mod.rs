// file: src/request/mod.rs
// description: request building and pre-submission validation

pub mod builder;

pub use builder::{FileCategory, JobRequest, RequestBuilder};
