//! Sync progress events and the retained last-run result.
//!
//! Events with a `syncUnit` are per-unit progress; an event with no unit and
//! a terminal status signals completion of the whole run. Events flow over a
//! broadcast channel so the UI and the connectivity prober can both observe
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Direction of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Upload,
    Download,
}

/// Status of a sync run or of the engine at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Success,
    Error,
    Partial,
}

impl SyncStatus {
    /// Whether this status ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Partial)
    }
}

/// A transient progress event for one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub direction: SyncDirection,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_units: Option<Vec<String>>,
}

impl SyncProgress {
    /// Per-unit progress event emitted before a unit is processed.
    pub fn unit(direction: SyncDirection, sync_unit: &str, current: usize, total: usize) -> Self {
        Self {
            direction,
            status: SyncStatus::Syncing,
            message: None,
            sync_unit: Some(sync_unit.to_string()),
            current: Some(current),
            total: Some(total),
            failed_units: None,
        }
    }

    /// Terminal event for the whole run; carries no unit.
    pub fn terminal(
        direction: SyncDirection,
        status: SyncStatus,
        message: Option<String>,
        failed_units: Vec<String>,
    ) -> Self {
        Self {
            direction,
            status,
            message,
            sync_unit: None,
            current: None,
            total: None,
            failed_units: if failed_units.is_empty() {
                None
            } else {
                Some(failed_units)
            },
        }
    }

    /// Idle event emitted when the transient progress clears.
    pub fn idle(direction: SyncDirection) -> Self {
        Self {
            direction,
            status: SyncStatus::Idle,
            message: None,
            sync_unit: None,
            current: None,
            total: None,
            failed_units: None,
        }
    }

    /// Whether this event ends a run (terminal status with no unit).
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal() && self.sync_unit.is_none()
    }
}

/// The last terminal outcome, retained after the transient progress clears.
/// Overwritten by each new terminal event and cleared on sign-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSyncResult {
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_units: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
}

impl LastSyncResult {
    /// Retain a terminal progress event.
    pub fn from_terminal(progress: &SyncProgress) -> Self {
        Self {
            status: progress.status,
            message: progress.message.clone(),
            failed_units: progress.failed_units.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast channel carrying progress events to any number of subscribers.
#[derive(Clone)]
pub struct ProgressChannel {
    tx: broadcast::Sender<SyncProgress>,
}

impl ProgressChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncProgress> {
        self.tx.subscribe()
    }

    /// Emit an event. Having no subscribers is not an error.
    pub fn emit(&self, progress: SyncProgress) {
        trace!(?progress, "progress event");
        let _ = self.tx.send(progress);
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new(64)
    }
}
