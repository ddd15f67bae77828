//! HTTP transfer engine.
//!
//! POSTs one multipart request to the analysis service's upload
//! endpoint, streaming the artifact content in chunks so progress can
//! be reported as bytes are handed to the transport.

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::Semaphore;

use buglens_common::Config;

use crate::progress::ProgressSender;
use crate::{classify, Artifact, UploadAcknowledgment, UploadError, UploadMetadata, UploadService};

/// Chunk size for the instrumented request body.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Real HTTP upload engine for the analysis service.
///
/// Exactly one transfer is in flight at a time: a capacity-1 semaphore
/// serializes concurrent callers instead of relying on the presentation
/// layer to gate submissions.
pub struct HttpUploadService {
    http: reqwest::Client,
    upload_url: String,
    in_flight: Semaphore,
}

impl HttpUploadService {
    /// Create a new HTTP upload engine from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: config.upload_url(),
            in_flight: Semaphore::new(1),
        }
    }
}

/// Chunked view of the artifact content that reports each chunk handed
/// to the transport as a progress tick.
fn chunk_stream(
    content: Bytes,
    total: u64,
    progress: ProgressSender,
) -> impl futures_util::Stream<Item = Result<Bytes, std::convert::Infallible>> {
    let mut offset = 0usize;
    let chunks = std::iter::from_fn(move || {
        if offset >= content.len() {
            return None;
        }
        let end = (offset + UPLOAD_CHUNK_BYTES).min(content.len());
        let chunk = content.slice(offset..end);
        offset = end;
        Some(chunk)
    });

    let mut sent: u64 = 0;
    futures_util::stream::iter(chunks).map(move |chunk: Bytes| {
        sent += chunk.len() as u64;
        progress.send_ratio(sent, total);
        Ok(chunk)
    })
}

/// Wrap the artifact content in a progress-instrumented request body.
fn progress_body(content: Bytes, total: u64, progress: ProgressSender) -> reqwest::Body {
    reqwest::Body::wrap_stream(chunk_stream(content, total, progress))
}

#[async_trait::async_trait]
impl UploadService for HttpUploadService {
    async fn begin_transfer(
        &self,
        artifact: Artifact,
        metadata: UploadMetadata,
        progress: ProgressSender,
    ) -> Result<UploadAcknowledgment, UploadError> {
        // Hold the single transfer slot for the whole exchange;
        // concurrent callers queue here.
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| UploadError::TransportFailure("upload engine shut down".to_string()))?;

        let display_name = artifact.display_name().to_string();
        let total = artifact.byte_size();
        tracing::debug!(
            artifact = %display_name,
            bytes = total,
            project = %metadata.project_name,
            "Starting upload transfer"
        );

        let body = progress_body(artifact.into_content(), total, progress);
        let file_part = reqwest::multipart::Part::stream_with_length(body, total)
            .file_name(display_name.clone());
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("project_name", metadata.project_name)
            .text("description", metadata.description);

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(classify::transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, artifact = %display_name, "Upload rejected by service");
            return Err(classify::http_status(status));
        }

        let body = response.text().await.map_err(classify::transport)?;
        let ack = classify::acknowledgment(&body)?;

        tracing::info!(
            artifact = %display_name,
            project_id = %ack.project_id,
            server_status = %ack.file_info.status,
            "Upload acknowledged"
        );
        Ok(ack)
    }
}
