//! Mock upload engine.
//!
//! Records submissions in memory and resolves with a programmable
//! outcome, so the pipeline can be exercised without a network.
//! Thread-safe via `Arc<Mutex<>>` / `RwLock`.

use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use uuid::Uuid;

use crate::progress::ProgressSender;
use crate::{
    Artifact, FileInfo, UploadAcknowledgment, UploadError, UploadMetadata, UploadService,
};

/// How a mock transfer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockOutcome {
    /// Resolve with a fabricated acknowledgment
    #[default]
    Complete,
    /// Resolve with a server-side rejection
    Reject,
    /// Resolve with a transport failure
    TransportFailure,
    /// Resolve as if the response body did not parse
    MalformedBody,
}

/// Programmable behavior shared by mock transfers.
#[derive(Debug)]
pub struct MockUploadBehavior {
    pub outcome: RwLock<MockOutcome>,
    pub progress_steps: RwLock<Vec<u8>>,
    pub reject_message: RwLock<Option<String>>,
}

/// Progress percentages a default-configured mock transfer walks through.
const DEFAULT_PROGRESS_STEPS: [u8; 3] = [10, 45, 100];

impl MockUploadBehavior {
    pub fn new() -> Self {
        Self {
            outcome: RwLock::new(MockOutcome::Complete),
            progress_steps: RwLock::new(DEFAULT_PROGRESS_STEPS.to_vec()),
            reject_message: RwLock::new(None),
        }
    }

    pub fn get_outcome(&self) -> MockOutcome {
        *self.outcome.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.write().unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    pub fn get_progress_steps(&self) -> Vec<u8> {
        self.progress_steps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_progress_steps(&self, steps: Vec<u8>) {
        *self
            .progress_steps
            .write()
            .unwrap_or_else(PoisonError::into_inner) = steps;
    }

    pub fn set_reject_message(&self, message: impl Into<String>) {
        *self
            .reject_message
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Restore the default behavior.
    pub fn reset(&self) {
        self.set_outcome(MockOutcome::Complete);
        self.set_progress_steps(DEFAULT_PROGRESS_STEPS.to_vec());
        *self
            .reject_message
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for MockUploadBehavior {
    fn default() -> Self {
        Self::new()
    }
}

/// One submission as the mock engine saw it.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub display_name: String,
    pub byte_size: u64,
    pub project_name: String,
    pub description: String,
}

/// Mock upload engine that records submissions for test assertions.
#[derive(Debug, Clone, Default)]
pub struct MockUploadService {
    behavior: Arc<MockUploadBehavior>,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
}

impl MockUploadService {
    /// Create a mock engine with default behavior (complete with the
    /// standard progress steps).
    pub fn new() -> Self {
        Self::default()
    }

    /// The programmable behavior shared with all clones.
    pub fn behavior(&self) -> &MockUploadBehavior {
        &self.behavior
    }

    /// Return all recorded submissions.
    pub fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear recorded submissions and restore default behavior.
    pub fn reset(&self) {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.behavior.reset();
    }

    fn fabricate_acknowledgment(artifact: &Artifact) -> UploadAcknowledgment {
        let now = Utc::now();
        let project_id = format!("project_{}", Uuid::new_v4().simple());
        UploadAcknowledgment {
            success: true,
            message: "file uploaded".to_string(),
            file_info: FileInfo {
                filename: format!(
                    "{}_{}",
                    now.format("%Y%m%d_%H%M%S"),
                    artifact.display_name()
                ),
                original_name: artifact.display_name().to_string(),
                size: artifact.byte_size(),
                extension: artifact.extension(),
                upload_time: now,
                file_path: format!("/uploads/{}/{}", project_id, artifact.display_name()),
                status: "uploaded".to_string(),
            },
            project_id,
            extracted_files: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl UploadService for MockUploadService {
    async fn begin_transfer(
        &self,
        artifact: Artifact,
        metadata: UploadMetadata,
        progress: ProgressSender,
    ) -> Result<UploadAcknowledgment, UploadError> {
        tracing::debug!(artifact = %artifact.display_name(), "Mock upload: recording submission");
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedUpload {
                display_name: artifact.display_name().to_string(),
                byte_size: artifact.byte_size(),
                project_name: metadata.project_name.clone(),
                description: metadata.description.clone(),
            });

        for step in self.behavior.get_progress_steps() {
            progress.send(step);
        }

        match self.behavior.get_outcome() {
            MockOutcome::Complete => Ok(Self::fabricate_acknowledgment(&artifact)),
            MockOutcome::Reject => {
                let message = self
                    .behavior
                    .reject_message
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
                    .unwrap_or_else(|| "upload failed: HTTP 400".to_string());
                Err(UploadError::ServerRejected(message))
            }
            MockOutcome::TransportFailure => Err(UploadError::TransportFailure(
                "connection refused (mock)".to_string(),
            )),
            MockOutcome::MalformedBody => Err(UploadError::MalformedAcknowledgment(
                "expected value at line 1 column 1 (mock)".to_string(),
            )),
        }
    }
}
