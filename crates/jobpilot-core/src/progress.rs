//! Non-blocking progress reporting and cooperative cancellation.
//!
//! The progress channel is bounded and drops messages on overflow: a slow
//! consumer must never stall the orchestrator. Cancellation is a shared
//! atomic flag polled at well-defined yield points, never a preemptive
//! abort.

use crate::types::Platform;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Channel capacity. Overflow drops the newest message.
const PROGRESS_CAPACITY: usize = 100;

/// Severity of a progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message.
    Info,
    /// Something degraded but the run continues.
    Warning,
    /// A failure the caller should surface.
    Error,
    /// A counted step within a known total.
    Progress,
    /// A completed milestone.
    Success,
}

/// One progress message delivered to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Platform the message concerns.
    pub platform: Platform,
    /// Message severity.
    pub severity: Severity,
    /// Human-readable text.
    pub message: String,
    /// Current step, for `Progress` messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    /// Total steps, for `Progress` messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
}

impl ProgressReport {
    /// Build a report with the current timestamp and no step counters.
    #[must_use]
    pub fn new(platform: Platform, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            platform,
            severity,
            message: message.into(),
            current: None,
            total: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Build a `Progress` report with step counters.
    #[must_use]
    pub fn step(
        platform: Platform,
        message: impl Into<String>,
        current: usize,
        total: usize,
    ) -> Self {
        Self {
            platform,
            severity: Severity::Progress,
            message: message.into(),
            current: Some(current),
            total: Some(total),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Sending half of the bounded progress channel.
///
/// Cloneable; all clones feed the same receiver.
#[derive(Debug, Clone)]
pub struct ProgressBus {
    tx: mpsc::Sender<ProgressReport>,
}

impl ProgressBus {
    /// Create a bus and its receiving end.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<ProgressReport>) {
        let (tx, rx) = mpsc::channel(PROGRESS_CAPACITY);
        (Self { tx }, rx)
    }

    /// Publish a report without blocking.
    ///
    /// A full channel drops the message; forward progress of the sender
    /// always wins over completeness of the report stream.
    pub fn publish(&self, report: ProgressReport) {
        if let Err(e) = self.tx.try_send(report) {
            tracing::debug!("progress report dropped: {}", e);
        }
    }

    /// Convenience wrapper around [`publish`](Self::publish).
    pub fn send(&self, platform: Platform, severity: Severity, message: impl Into<String>) {
        self.publish(ProgressReport::new(platform, severity, message));
    }
}

/// Cooperative cancellation flag shared across all loops of a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for a new run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
