//! Remote Object Store collaborator contract.
//!
//! The engine treats every call as failable and retriable; it never
//! implements the transport itself.

use crate::crypto::envelope::SyncEnvelope;
use crate::Result;
use async_trait::async_trait;

/// One stored remote object, as returned by the bulk listing.
///
/// `envelope` is `None` when the stored object could not be parsed as a
/// sync envelope at all.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub file_id: String,
    pub file_name: String,
    pub envelope: Option<SyncEnvelope>,
}

/// Remote object store keyed by sync-unit name.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the envelope stored for a unit, if any.
    async fn get_envelope(&self, sync_unit: &str) -> Result<Option<SyncEnvelope>>;

    /// Replace the envelope stored for a unit (last write wins).
    async fn put_envelope(&self, sync_unit: &str, envelope: &SyncEnvelope) -> Result<()>;

    /// Delete one stored object by id.
    async fn delete_object(&self, file_id: &str) -> Result<()>;

    /// List every stored object (used by the undecryptable scan and by
    /// `All`-scope downloads).
    async fn list_objects(&self) -> Result<Vec<RemoteObject>>;

    /// Whether the remote side holds a password-verification marker.
    async fn has_password_marker(&self) -> Result<bool>;
}
