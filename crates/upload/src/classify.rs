//! Error classification: pure mappings from raw transfer failures onto
//! the closed `UploadError` taxonomy.
//!
//! The first terminal signal observed wins; a failure is never
//! re-classified after the engine has resolved.

use crate::{UploadAcknowledgment, UploadError};

/// The connection never completed; no HTTP semantics are available.
pub fn transport(err: reqwest::Error) -> UploadError {
    UploadError::TransportFailure(err.to_string())
}

/// The exchange completed with a non-success status.
pub fn http_status(status: reqwest::StatusCode) -> UploadError {
    UploadError::ServerRejected(format!("upload failed: HTTP {}", status.as_u16()))
}

/// Interpret a 2xx response body. An unparsable body is a malformed
/// acknowledgment; a parsed body with `success: false` is a server
/// rejection carrying the service's own message.
pub fn acknowledgment(body: &str) -> Result<UploadAcknowledgment, UploadError> {
    let ack: UploadAcknowledgment = serde_json::from_str(body)
        .map_err(|err| UploadError::MalformedAcknowledgment(err.to_string()))?;

    if !ack.success {
        return Err(UploadError::ServerRejected(ack.message));
    }

    Ok(ack)
}
