//! Submission pipeline: validation gate → transfer engine → history.
//!
//! One submission yields at most one `TransferRecord` (success) or one
//! `UploadError` (failure), never both. A failed transfer leaves the
//! history untouched.

use uuid::Uuid;

use buglens_history::{TransferRecord, UploadHistory};

use crate::policy::{self, AcceptancePolicy};
use crate::progress::ProgressSender;
use crate::{Artifact, UploadAcknowledgment, UploadError, UploadMetadata, UploadService};

/// Build the durable record for a successful transfer, copying the
/// acknowledgment's `file_info` and `project_id` verbatim and stamping
/// a fresh correlation id.
pub fn record_from_acknowledgment(ack: &UploadAcknowledgment) -> TransferRecord {
    let info = &ack.file_info;
    TransferRecord {
        source_name: info.filename.clone(),
        original_display_name: info.original_name.clone(),
        byte_size: info.size,
        extension: info.extension.clone(),
        completed_at: info.upload_time,
        server_path: info.file_path.clone(),
        status: info.status.clone(),
        project_id: ack.project_id.clone(),
        correlation_id: Uuid::new_v4(),
    }
}

/// Ties the acceptance policy, a transfer engine, and the upload
/// history into one submission flow.
pub struct UploadPipeline {
    policy: AcceptancePolicy,
    service: Box<dyn UploadService>,
    history: UploadHistory,
}

impl UploadPipeline {
    /// Create a pipeline with the default acceptance policy and an
    /// empty history.
    pub fn new(service: Box<dyn UploadService>) -> Self {
        Self::with_policy(service, AcceptancePolicy::default())
    }

    pub fn with_policy(service: Box<dyn UploadService>, policy: AcceptancePolicy) -> Self {
        Self {
            policy,
            service,
            history: UploadHistory::new(),
        }
    }

    pub fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    /// The pipeline's view of completed transfers.
    pub fn history(&self) -> &UploadHistory {
        &self.history
    }

    /// Submit one artifact: validate, transfer with progress, and on
    /// success append the record to the history.
    pub async fn submit(
        &self,
        artifact: Artifact,
        progress: ProgressSender,
    ) -> Result<TransferRecord, UploadError> {
        policy::validate(&artifact, &self.policy)?;

        let metadata = UploadMetadata::generate();
        tracing::debug!(
            artifact = %artifact.display_name(),
            project = %metadata.project_name,
            "Artifact accepted, beginning transfer"
        );

        let ack = self
            .service
            .begin_transfer(artifact, metadata, progress)
            .await?;

        let record = record_from_acknowledgment(&ack);
        self.history.append(record.clone());
        Ok(record)
    }
}
