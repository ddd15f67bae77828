//! Progress reporting for one transfer.
//!
//! Progress flows over a tokio mpsc channel as integer percentages.
//! The sender enforces the per-transfer ordering contract: values are
//! clamped into [0, 100] and never decrease, and the channel closes
//! exactly once when the engine resolves, after which nothing further
//! is delivered.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One progress update within a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    /// Percentage of bytes handed to the transport, in [0, 100]
    pub percent: u8,
}

/// Receiving end of the progress channel.
pub type ProgressReceiver = mpsc::UnboundedReceiver<TransferProgress>;

/// Sending end of the progress channel, shared between the caller-facing
/// engine and the instrumented request body.
///
/// Clones share the monotonic high-water mark, so a late clone can never
/// roll the percentage back.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<TransferProgress>,
    high_water: Arc<AtomicU8>,
}

impl ProgressSender {
    /// Create a progress channel for one transfer.
    pub fn channel() -> (Self, ProgressReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                high_water: Arc::new(AtomicU8::new(0)),
            },
            rx,
        )
    }

    /// A sender whose updates are discarded, for callers that do not
    /// observe progress.
    pub fn sink() -> Self {
        let (sender, rx) = Self::channel();
        drop(rx);
        sender
    }

    /// Deliver one update, clamped into [0, 100] and raised to the
    /// high-water mark so observed percentages never decrease.
    pub fn send(&self, percent: u8) {
        let capped = percent.min(100);
        let previous = self.high_water.fetch_max(capped, Ordering::SeqCst);
        let value = capped.max(previous);
        // The receiver may already be gone; progress is best-effort.
        let _ = self.tx.send(TransferProgress { percent: value });
    }

    /// Deliver an update computed as round(loaded / total * 100).
    /// A zero total means the denominator is unknown; no tick is
    /// emitted (the terminal event still fires).
    pub fn send_ratio(&self, loaded: u64, total: u64) {
        if total == 0 {
            return;
        }
        let percent = ((loaded as f64 / total as f64) * 100.0).round().min(100.0) as u8;
        self.send(percent);
    }
}
