// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connection failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// True when the error was reported by the service rather than raised locally.
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientError::Api { .. })
    }
}
