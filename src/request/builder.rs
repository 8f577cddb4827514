// file: src/request/builder.rs
// description: gathers and validates user input before any network call
// reference: input validation patterns

use crate::error::{ClientError, Result};
use crate::utils::validation::Validator;
use reqwest::multipart::{Form, Part};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File class accepted by a pipeline screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Spreadsheet,
    Audio,
}

impl FileCategory {
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            FileCategory::Image => &["jpg", "jpeg", "png", "webp"],
            FileCategory::Spreadsheet => &["xlsx", "xls", "csv"],
            FileCategory::Audio => &["mp3", "wav", "m4a", "flac", "ogg"],
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Spreadsheet => "spreadsheet",
            FileCategory::Audio => "audio",
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("csv") => "text/csv",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/x-wav",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// A validated, ready-to-send payload. Construction goes through
/// [`RequestBuilder::build`]; an instance existing means validation passed.
#[derive(Debug, Clone)]
pub struct JobRequest {
    files: Vec<PathBuf>,
    api_key: Option<String>,
    params: Vec<(String, String)>,
    file_field: &'static str,
}

impl JobRequest {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Builds the outgoing multipart form, reading file contents from disk.
    pub async fn into_form(self) -> Result<Form> {
        let mut form = Form::new();

        for path in &self.files {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| ClientError::FileOperation {
                    path: path.clone(),
                    source,
                })?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            debug!("Attaching {} ({} bytes)", name, bytes.len());

            let part = Part::bytes(bytes)
                .file_name(name)
                .mime_str(mime_for(path))?;
            form = form.part(self.file_field, part);
        }

        if let Some(key) = self.api_key {
            form = form.text("openai_api_key", key);
        }

        for (name, value) in self.params {
            form = form.text(name, value);
        }

        Ok(form)
    }
}

/// Collects form fields and enforces the validation rules before anything is
/// sent: at least one file, allowed extension, size ceiling, and a non-empty
/// credential where one is required.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    category: FileCategory,
    files: Vec<PathBuf>,
    api_key: Option<String>,
    require_api_key: bool,
    max_upload_mb: Option<u64>,
    params: Vec<(String, String)>,
    file_field: &'static str,
}

impl RequestBuilder {
    pub fn new(category: FileCategory) -> Self {
        Self {
            category,
            files: Vec::new(),
            api_key: None,
            require_api_key: false,
            max_upload_mb: None,
            params: Vec::new(),
            file_field: "files",
        }
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn require_api_key(mut self) -> Self {
        self.require_api_key = true;
        self
    }

    pub fn max_upload_mb(mut self, limit: u64) -> Self {
        self.max_upload_mb = Some(limit);
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Some endpoints expect the upload under `file` instead of `files`.
    pub fn file_field(mut self, field: &'static str) -> Self {
        self.file_field = field;
        self
    }

    pub fn build(self) -> Result<JobRequest> {
        if self.files.is_empty() {
            return Err(ClientError::Validation("select a file".to_string()));
        }

        for path in &self.files {
            Validator::validate_file_exists(path)?;
            Validator::validate_extension(path, self.category.allowed_extensions())
                .map_err(|_| {
                    ClientError::Validation(format!(
                        "{} is not a supported {} file (expected one of: {})",
                        path.display(),
                        self.category.describe(),
                        self.category.allowed_extensions().join(", ")
                    ))
                })?;

            if let Some(limit_mb) = self.max_upload_mb {
                let size = fs::metadata(path)
                    .map_err(|source| ClientError::FileOperation {
                        path: path.clone(),
                        source,
                    })?
                    .len();
                if size > limit_mb * 1024 * 1024 {
                    return Err(ClientError::Validation(format!(
                        "{} exceeds the {} MB upload limit",
                        path.display(),
                        limit_mb
                    )));
                }
            }
        }

        let api_key = match self.api_key {
            Some(key) => {
                let trimmed = key.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            None => None,
        };

        if self.require_api_key && api_key.is_none() {
            return Err(ClientError::Validation(
                "API key is required for this pipeline".to_string(),
            ));
        }

        Ok(JobRequest {
            files: self.files,
            api_key,
            params: self.params,
            file_field: self.file_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str, bytes: usize) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, vec![0u8; bytes]).unwrap();
        path
    }

    #[test]
    fn test_no_file_selected_rejected() {
        let err = RequestBuilder::new(FileCategory::Image)
            .api_key(Some("sk-test".to_string()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("select a file"));
    }

    #[test]
    fn test_blank_api_key_rejected_when_required() {
        let dir = TempDir::new().unwrap();
        let image = touch(&dir, "scan.jpg", 16);

        let err = RequestBuilder::new(FileCategory::Image)
            .file(&image)
            .api_key(Some("   ".to_string()))
            .require_api_key()
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn test_api_key_trimmed() {
        let dir = TempDir::new().unwrap();
        let image = touch(&dir, "scan.png", 16);

        let request = RequestBuilder::new(FileCategory::Image)
            .file(&image)
            .api_key(Some("  sk-test  ".to_string()))
            .require_api_key()
            .build()
            .unwrap();
        assert_eq!(request.api_key(), Some("sk-test"));
    }

    #[test]
    fn test_wrong_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let doc = touch(&dir, "notes.txt", 16);

        let err = RequestBuilder::new(FileCategory::Spreadsheet)
            .file(&doc)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("spreadsheet"));
    }

    #[test]
    fn test_size_ceiling_enforced() {
        let dir = TempDir::new().unwrap();
        let audio = touch(&dir, "clip.mp3", 2 * 1024 * 1024);

        let err = RequestBuilder::new(FileCategory::Audio)
            .file(&audio)
            .max_upload_mb(1)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("upload limit"));

        let ok = RequestBuilder::new(FileCategory::Audio)
            .file(&audio)
            .max_upload_mb(500)
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = RequestBuilder::new(FileCategory::Image)
            .file("/nonexistent/scan.jpg")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_form_assembly() {
        let dir = TempDir::new().unwrap();
        let sheet = touch(&dir, "clips.xlsx", 64);

        let request = RequestBuilder::new(FileCategory::Spreadsheet)
            .file(&sheet)
            .api_key(Some("sk-test".to_string()))
            .param("clip_id_column", "A")
            .build()
            .unwrap();

        assert!(request.into_form().await.is_ok());
    }
}
