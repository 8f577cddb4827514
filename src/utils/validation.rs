// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{ClientError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_file_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ClientError::Validation(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        if !path.is_file() {
            return Err(ClientError::Validation(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_extension(path: &Path, allowed: &[&str]) -> Result<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext {
            Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
            _ => Err(ClientError::Validation(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    pub fn validate_not_blank(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ClientError::Validation(format!("{} is required", field)));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Truncates on a character boundary; raw response bodies can be any
    /// encoding.
    pub fn truncate_text(text: &str, max_length: usize) -> String {
        if text.chars().count() <= max_length {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max_length).collect();
            format!("{}...", truncated)
        }
    }
}
