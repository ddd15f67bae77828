//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::ConfigError;

/// Path of the upload endpoint on the analysis service.
pub const UPLOAD_PATH: &str = "/api/upload";

/// Upload client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upload provider (http, mock)
    pub provider: String,

    /// Base URL of the defect-analysis service
    pub base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let provider =
            env::var("BUGLENS_UPLOAD_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let base_url = env::var("BUGLENS_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        if base_url.is_empty() {
            return Err(ConfigError::Invalid(
                "BUGLENS_API_BASE_URL must not be empty".to_string(),
            ));
        }

        tracing::debug!(provider = %provider, base_url = %base_url, "Upload client configuration loaded");

        Ok(Self { provider, base_url })
    }

    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), UPLOAD_PATH)
    }
}
