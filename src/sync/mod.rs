//! Multi-unit encrypted synchronization.
//!
//! Each sync unit is an independently encrypted, independently versioned
//! partition of local state. The orchestrator drives per-unit upload/download
//! runs with failure isolation; the prober and pending-change tracker feed
//! sync status independently of the orchestrator.

pub mod auth;
pub mod cleaner;
pub mod local;
pub mod orchestrator;
pub mod pending;
pub mod prober;
pub mod progress;
pub mod remote;
pub mod unit;

#[cfg(test)]
pub(crate) mod testutil;

pub use orchestrator::{RunSummary, SyncOrchestrator, SyncRequest};
pub use progress::{LastSyncResult, SyncDirection, SyncProgress, SyncStatus};
pub use unit::{Scope, SyncBundle};
