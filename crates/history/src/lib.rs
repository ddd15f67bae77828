//! Client-side upload history for the BugLens upload client
//!
//! Owns the ordered list of completed transfers:
//! - `TransferRecord`: the durable result of one successful upload,
//!   never mutated after creation
//! - `UploadHistory`: the single owner of the record sequence; all
//!   mutation routes through it
//!
//! A failed transfer never produces a record, so the history is only
//! ever touched on the success path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Server-asserted status marking an upload as fully stored.
/// Any other value means the artifact is still being processed.
pub const STATUS_UPLOADED: &str = "uploaded";

/// The durable client-side result of one completed transfer.
///
/// Two uploads of identically-named artifacts produce two distinct
/// records, told apart by `correlation_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Storage name assigned by the service
    pub source_name: String,
    /// Name of the artifact as the user selected it
    pub original_display_name: String,
    pub byte_size: u64,
    pub extension: String,
    pub completed_at: DateTime<Utc>,
    /// Path of the stored artifact on the service
    pub server_path: String,
    /// Server-asserted processing status; the client does not second-guess it
    pub status: String,
    pub project_id: String,
    /// Client-generated id distinguishing records with identical content
    pub correlation_id: Uuid,
}

impl TransferRecord {
    /// Whether the service has asserted the artifact is fully stored.
    pub fn is_uploaded(&self) -> bool {
        self.status == STATUS_UPLOADED
    }
}

/// Insertion-ordered sequence of completed transfers.
///
/// Cloning shares the underlying list; concurrent callers route through
/// the interior mutex rather than ad-hoc shared state.
#[derive(Debug, Clone, Default)]
pub struct UploadHistory {
    records: Arc<Mutex<Vec<TransferRecord>>>,
}

impl UploadHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the end of the sequence. No deduplication.
    pub fn append(&self, record: TransferRecord) {
        tracing::debug!(
            artifact = %record.original_display_name,
            correlation_id = %record.correlation_id,
            "Recording completed upload"
        );
        self.lock().push(record);
    }

    /// Remove the record at `index`; later records shift down by one.
    /// An out-of-range index is silently ignored.
    pub fn remove(&self, index: usize) {
        let mut records = self.lock();
        if index < records.len() {
            let removed = records.remove(index);
            tracing::debug!(
                artifact = %removed.original_display_name,
                correlation_id = %removed.correlation_id,
                "Removed upload record"
            );
        } else {
            tracing::debug!(index, len = records.len(), "Ignoring out-of-range removal");
        }
    }

    /// Snapshot of the full ordered sequence.
    pub fn records(&self) -> Vec<TransferRecord> {
        self.lock().clone()
    }

    /// Running count of completed transfers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TransferRecord>> {
        // Poisoning only marks a panic elsewhere; the Vec itself stays valid.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
