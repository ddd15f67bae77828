//! Acceptance policy: the pre-flight gate every artifact must pass
//! before any network activity happens.

use std::collections::HashSet;

use crate::{Artifact, UploadError};

/// Extensions the analysis service accepts.
pub const ALLOWED_EXTENSIONS: [&str; 9] = [
    ".cpp", ".hpp", ".h", ".c", ".cc", ".cxx", ".zip", ".tar.gz", ".tgz",
];

/// Size ceiling for a single artifact: 50 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Immutable acceptance policy for one upload session.
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    allowed_extensions: HashSet<String>,
    max_bytes: u64,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self::new(ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES)
    }
}

impl AcceptancePolicy {
    pub fn new(
        allowed_extensions: impl IntoIterator<Item = impl Into<String>>,
        max_bytes: u64,
    ) -> Self {
        Self {
            allowed_extensions: allowed_extensions.into_iter().map(Into::into).collect(),
            max_bytes,
        }
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(extension)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

/// Extension as the gate derives it: a dot plus the lower-cased text
/// after the final dot. A name with no dot yields the whole name
/// prefixed by a dot, tested for membership like any other string.
///
/// Multi-part suffixes never match this rule: "src.tar.gz" derives
/// ".gz", so of the archive entries only ".zip" and ".tgz" are
/// reachable.
pub fn extension_of(display_name: &str) -> String {
    let tail = display_name
        .rsplit_once('.')
        .map_or(display_name, |(_, tail)| tail);
    format!(".{}", tail.to_lowercase())
}

/// Check an artifact against the acceptance policy.
///
/// Checks run in order and short-circuit on the first failure:
/// extension membership, then the strict size ceiling (an artifact
/// exactly at the ceiling passes). A rejected artifact must never reach
/// the transfer engine.
pub fn validate(artifact: &Artifact, policy: &AcceptancePolicy) -> Result<(), UploadError> {
    let extension = artifact.extension();
    if !policy.allows_extension(&extension) {
        tracing::debug!(
            artifact = %artifact.display_name(),
            extension = %extension,
            "Rejecting artifact: unsupported type"
        );
        return Err(UploadError::PolicyRejected(format!(
            "unsupported type: {extension}"
        )));
    }

    if artifact.byte_size() > policy.max_bytes() {
        tracing::debug!(
            artifact = %artifact.display_name(),
            bytes = artifact.byte_size(),
            limit = policy.max_bytes(),
            "Rejecting artifact: too large"
        );
        return Err(UploadError::PolicyRejected(format!(
            "too large: {} bytes exceeds the {} byte limit",
            artifact.byte_size(),
            policy.max_bytes()
        )));
    }

    Ok(())
}
