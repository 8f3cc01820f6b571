//! Local state collaborator contract.
//!
//! Supplies the unit indices and serialized payloads the orchestrator works
//! with, plus the push-based pending-change watcher the tracker subscribes
//! to. The engine never reaches into local storage directly.

use crate::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Local data partitions behind the sync engine.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Favorite-type index (one sync unit per type).
    async fn favorite_types(&self) -> Result<Vec<String>>;

    /// Known keyboard uids (two sync units per keyboard).
    async fn keyboard_uids(&self) -> Result<Vec<String>>;

    /// Serialized payload of one unit, `None` when the unit has no local
    /// state yet.
    async fn load_unit(&self, sync_unit: &str) -> Result<Option<String>>;

    /// Replace one unit's local state with a downloaded payload.
    async fn apply_unit(&self, sync_unit: &str, payload: String) -> Result<()>;

    /// One-time startup fetch of the dirty state. After this the tracker is
    /// updated exclusively through [`LocalStore::watch_pending`].
    async fn has_pending_changes(&self) -> Result<bool>;

    /// Subscribe to push notifications from the local-storage watcher. Each
    /// message is the new aggregate dirty state.
    fn watch_pending(&self) -> mpsc::UnboundedReceiver<bool>;
}
