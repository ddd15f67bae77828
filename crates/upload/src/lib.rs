//! BugLens Upload Pipeline
//!
//! Sends a single user-selected artifact to the defect-analysis service:
//! - Acceptance policy check before any network activity (`policy`)
//! - Progress-tracked multipart transfer with support for:
//!   - Real HTTP transfers via reqwest for production (`client`)
//!   - Mock transfers with programmable outcomes for testing (`mock`)
//! - Closed failure taxonomy with human-readable messages (`classify`)
//! - Wiring of gate, engine, and history into one submission flow
//!   (`pipeline`)

pub mod classify;
pub mod client;
pub mod mock;
pub mod pipeline;
pub mod policy;
pub mod progress;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use buglens_common::{Config, ConfigError};

use crate::progress::ProgressSender;

/// Terminal failure of one upload attempt.
///
/// Every variant is surfaced to the caller exactly once and never
/// retried; a failed transfer leaves the client in the same state as
/// before the attempt.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The artifact failed the acceptance policy. Nothing was sent over
    /// the wire.
    #[error("upload rejected: {0}")]
    PolicyRejected(String),

    /// The connection never completed; no HTTP semantics are available.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The service refused the upload, either with an HTTP error status
    /// or an acknowledgment carrying `success: false`.
    #[error("{0}")]
    ServerRejected(String),

    /// The response body did not parse as an acknowledgment.
    #[error("malformed acknowledgment: {0}")]
    MalformedAcknowledgment(String),
}

impl UploadError {
    /// Stable code identifying the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::PolicyRejected(_) => "POLICY_REJECTED",
            UploadError::TransportFailure(_) => "TRANSPORT_FAILURE",
            UploadError::ServerRejected(_) => "SERVER_REJECTED",
            UploadError::MalformedAcknowledgment(_) => "MALFORMED_ACKNOWLEDGMENT",
        }
    }
}

/// A user-selected source file or archive, held in memory until the
/// transfer engine consumes it.
#[derive(Debug, Clone)]
pub struct Artifact {
    display_name: String,
    content: Bytes,
}

impl Artifact {
    /// Create an artifact from its display name and raw content.
    pub fn new(display_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            display_name: display_name.into(),
            content: content.into(),
        }
    }

    /// Load an artifact from a file on disk, using the file name as the
    /// display name.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
            })?;
        let content = tokio::fs::read(path).await?;
        Ok(Self::new(display_name, content))
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn byte_size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Extension as the acceptance policy sees it: a dot plus the
    /// lower-cased text after the final dot in the display name.
    pub fn extension(&self) -> String {
        policy::extension_of(&self.display_name)
    }

    pub(crate) fn into_content(self) -> Bytes {
        self.content
    }
}

/// Fixed description sent with every upload.
pub const UPLOAD_DESCRIPTION: &str = "C++ source upload for automated defect analysis";

/// Caller-supplied metadata accompanying one transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub project_name: String,
    pub description: String,
}

impl UploadMetadata {
    /// Generate metadata for a fresh submission: a timestamped project
    /// name and the fixed description.
    pub fn generate() -> Self {
        Self {
            project_name: format!("Project_{}", Utc::now().timestamp_millis()),
            description: UPLOAD_DESCRIPTION.to_string(),
        }
    }
}

/// Description of the stored artifact inside an acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Storage name assigned by the service
    pub filename: String,
    /// Name of the artifact as uploaded
    pub original_name: String,
    pub size: u64,
    pub extension: String,
    pub upload_time: DateTime<Utc>,
    pub file_path: String,
    /// Server-asserted status ("uploaded" vs. still processing)
    pub status: String,
}

/// Structured success response from the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadAcknowledgment {
    pub success: bool,
    pub message: String,
    pub file_info: FileInfo,
    pub project_id: String,
    /// Files unpacked server-side when the artifact was an archive.
    /// Carried through verbatim, not interpreted by the client.
    #[serde(default)]
    pub extracted_files: Vec<FileInfo>,
}

/// Transfer engine trait for different upload backends.
#[async_trait::async_trait]
pub trait UploadService: Send + Sync {
    /// Transfer one artifact to the service, streaming progress to
    /// `progress`, and resolve to the parsed acknowledgment or a
    /// classified failure. No progress is delivered after resolution.
    async fn begin_transfer(
        &self,
        artifact: Artifact,
        metadata: UploadMetadata,
        progress: ProgressSender,
    ) -> Result<UploadAcknowledgment, UploadError>;
}

/// Factory for creating UploadService implementations.
pub struct UploadServiceFactory;

impl UploadServiceFactory {
    /// Create an UploadService based on configuration.
    pub fn create(config: &Config) -> Result<Box<dyn UploadService>, ConfigError> {
        match config.provider.as_str() {
            "http" => {
                tracing::info!("Creating HTTP upload service");
                Ok(Box::new(client::HttpUploadService::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock upload service");
                Ok(Box::new(mock::MockUploadService::new()))
            }
            provider => Err(ConfigError::UnknownProvider(provider.to_string())),
        }
    }
}
