// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{ClientError, Result};
use crate::utils::validation::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub services: ServicesConfig,
    pub client: ClientConfig,
    pub export: ExportConfig,
}

/// Base URLs of the pipeline services. Paths under each base are fixed by the
/// service contracts and not configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServicesConfig {
    pub ocr_base_url: String,
    pub hunyuan_ocr_base_url: String,
    pub iflas_base_url: String,
    pub kunye_base_url: String,
    pub kunye_web_base_url: String,
    pub audio_base_url: String,
    pub radio_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub max_audio_upload_mb: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub pretty_json: bool,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MTM_PIPELINES")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            services: ServicesConfig {
                ocr_base_url: "http://localhost:8001".to_string(),
                hunyuan_ocr_base_url: "http://localhost:8006".to_string(),
                iflas_base_url: "http://localhost:8003".to_string(),
                kunye_base_url: "http://localhost:8004".to_string(),
                kunye_web_base_url: "http://localhost:8008".to_string(),
                audio_base_url: "http://localhost:8005".to_string(),
                radio_base_url: "http://localhost:8007".to_string(),
            },
            client: ClientConfig {
                poll_interval_secs: 2,
                request_timeout_secs: 300,
                max_audio_upload_mb: 500,
            },
            export: ExportConfig {
                output_dir: PathBuf::from("./exports"),
                pretty_json: false,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.client.poll_interval_secs == 0 {
            return Err(ClientError::Config(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.client.max_audio_upload_mb == 0 {
            return Err(ClientError::Config(
                "max_audio_upload_mb must be greater than 0".to_string(),
            ));
        }

        for url in [
            &self.services.ocr_base_url,
            &self.services.hunyuan_ocr_base_url,
            &self.services.iflas_base_url,
            &self.services.kunye_base_url,
            &self.services.kunye_web_base_url,
            &self.services.audio_base_url,
            &self.services.radio_base_url,
        ] {
            Validator::validate_url(url)
                .map_err(|_| ClientError::Config(format!("Invalid service URL: {}", url)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = Config::default_config();
        config.client.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_service_url_rejected() {
        let mut config = Config::default_config();
        config.services.audio_base_url = "ftp://audio".to_string();
        assert!(config.validate().is_err());
    }
}
