//! In-memory fake collaborators shared by the sync test modules.

use crate::crypto::envelope::SyncEnvelope;
use crate::sync::auth::{IdentityProvider, SessionStatus};
use crate::sync::local::LocalStore;
use crate::sync::remote::{RemoteObject, RemoteStore};
use crate::{EngineError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

/// In-memory local store with configurable indices and a manual watcher.
pub struct MemoryLocal {
    favorite_types: Vec<String>,
    keyboard_uids: Vec<String>,
    units: Mutex<HashMap<String, String>>,
    pending: Mutex<bool>,
    watchers: Mutex<Vec<mpsc::UnboundedSender<bool>>>,
}

impl MemoryLocal {
    pub fn with_indices(favorite_types: &[&str], keyboard_uids: &[&str]) -> Self {
        Self {
            favorite_types: favorite_types.iter().map(|s| s.to_string()).collect(),
            keyboard_uids: keyboard_uids.iter().map(|s| s.to_string()).collect(),
            units: Mutex::new(HashMap::new()),
            pending: Mutex::new(false),
            watchers: Mutex::new(Vec::new()),
        }
    }

    pub fn insert_unit(&self, sync_unit: &str, payload: &str) {
        self.units
            .lock()
            .unwrap()
            .insert(sync_unit.to_string(), payload.to_string());
    }

    pub fn unit(&self, sync_unit: &str) -> Option<String> {
        self.units.lock().unwrap().get(sync_unit).cloned()
    }

    /// Simulate a push notification from the local-storage watcher.
    pub fn push_pending(&self, pending: bool) {
        *self.pending.lock().unwrap() = pending;
        self.watchers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(pending).is_ok());
    }

    pub fn set_initial_pending(&self, pending: bool) {
        *self.pending.lock().unwrap() = pending;
    }
}

#[async_trait]
impl LocalStore for MemoryLocal {
    async fn favorite_types(&self) -> Result<Vec<String>> {
        Ok(self.favorite_types.clone())
    }

    async fn keyboard_uids(&self) -> Result<Vec<String>> {
        Ok(self.keyboard_uids.clone())
    }

    async fn load_unit(&self, sync_unit: &str) -> Result<Option<String>> {
        Ok(self.units.lock().unwrap().get(sync_unit).cloned())
    }

    async fn apply_unit(&self, sync_unit: &str, payload: String) -> Result<()> {
        self.units
            .lock()
            .unwrap()
            .insert(sync_unit.to_string(), payload);
        Ok(())
    }

    async fn has_pending_changes(&self) -> Result<bool> {
        Ok(*self.pending.lock().unwrap())
    }

    fn watch_pending(&self) -> mpsc::UnboundedReceiver<bool> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.lock().unwrap().push(tx);
        rx
    }
}

/// In-memory remote store with failure injection and a scripted
/// password-marker probe.
pub struct MemoryRemote {
    envelopes: Mutex<HashMap<String, SyncEnvelope>>,
    extra_objects: Mutex<Vec<RemoteObject>>,
    fail_units: Mutex<HashSet<String>>,
    fail_deletes: Mutex<HashSet<String>>,
    fail_listing: AtomicBool,
    marker: Mutex<bool>,
    marker_script: Mutex<VecDeque<Result<bool>>>,
    marker_calls: AtomicU32,
    hold_gets: Mutex<Option<watch::Receiver<bool>>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            envelopes: Mutex::new(HashMap::new()),
            extra_objects: Mutex::new(Vec::new()),
            fail_units: Mutex::new(HashSet::new()),
            fail_deletes: Mutex::new(HashSet::new()),
            fail_listing: AtomicBool::new(false),
            marker: Mutex::new(false),
            marker_script: Mutex::new(VecDeque::new()),
            marker_calls: AtomicU32::new(0),
            hold_gets: Mutex::new(None),
        }
    }

    pub fn insert_envelope(&self, envelope: SyncEnvelope) {
        self.envelopes
            .lock()
            .unwrap()
            .insert(envelope.sync_unit.clone(), envelope);
    }

    pub fn envelope(&self, sync_unit: &str) -> Option<SyncEnvelope> {
        self.envelopes.lock().unwrap().get(sync_unit).cloned()
    }

    pub fn insert_raw_object(&self, file_id: &str, file_name: &str) {
        self.extra_objects.lock().unwrap().push(RemoteObject {
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            envelope: None,
        });
    }

    /// Make get/put for one unit fail with a connectivity error.
    pub fn fail_unit(&self, sync_unit: &str) {
        self.fail_units.lock().unwrap().insert(sync_unit.to_string());
    }

    pub fn fail_delete(&self, file_id: &str) {
        self.fail_deletes.lock().unwrap().insert(file_id.to_string());
    }

    /// Make `list_objects` fail with a connectivity error.
    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    /// Script the next password-marker probe results, oldest first.
    pub fn script_marker(&self, results: Vec<Result<bool>>) {
        *self.marker_script.lock().unwrap() = results.into_iter().collect();
    }

    pub fn marker_calls(&self) -> u32 {
        self.marker_calls.load(Ordering::SeqCst)
    }

    /// Block `get_envelope` calls until `true` is sent on the returned channel.
    pub fn hold_gets(&self) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        *self.hold_gets.lock().unwrap() = Some(rx);
        tx
    }

    fn check_unit(&self, sync_unit: &str) -> Result<()> {
        if self.fail_units.lock().unwrap().contains(sync_unit) {
            return Err(EngineError::Connectivity(format!(
                "Remote store rejected {}",
                sync_unit
            )));
        }
        Ok(())
    }

    async fn wait_for_release(&self) {
        let rx = self.hold_gets.lock().unwrap().clone();
        if let Some(mut rx) = rx {
            while !*rx.borrow() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get_envelope(&self, sync_unit: &str) -> Result<Option<SyncEnvelope>> {
        self.wait_for_release().await;
        self.check_unit(sync_unit)?;
        Ok(self.envelopes.lock().unwrap().get(sync_unit).cloned())
    }

    async fn put_envelope(&self, sync_unit: &str, envelope: &SyncEnvelope) -> Result<()> {
        self.check_unit(sync_unit)?;
        self.envelopes
            .lock()
            .unwrap()
            .insert(sync_unit.to_string(), envelope.clone());
        Ok(())
    }

    async fn delete_object(&self, file_id: &str) -> Result<()> {
        if self.fail_deletes.lock().unwrap().contains(file_id) {
            return Err(EngineError::Connectivity(format!(
                "Delete rejected for {}",
                file_id
            )));
        }
        self.envelopes.lock().unwrap().remove(file_id);
        self.extra_objects
            .lock()
            .unwrap()
            .retain(|o| o.file_id != file_id);
        Ok(())
    }

    async fn list_objects(&self) -> Result<Vec<RemoteObject>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(EngineError::Connectivity(
                "Listing rejected".to_string(),
            ));
        }
        let mut objects: Vec<RemoteObject> = self
            .envelopes
            .lock()
            .unwrap()
            .values()
            .map(|env| RemoteObject {
                file_id: env.sync_unit.clone(),
                file_name: format!("{}.json", env.sync_unit.replace('/', "_")),
                envelope: Some(env.clone()),
            })
            .collect();
        objects.sort_by(|a, b| a.file_id.cmp(&b.file_id));
        objects.extend(self.extra_objects.lock().unwrap().iter().cloned());
        Ok(objects)
    }

    async fn has_password_marker(&self) -> Result<bool> {
        self.marker_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.marker_script.lock().unwrap().pop_front() {
            return result;
        }
        Ok(*self.marker.lock().unwrap())
    }
}

/// In-memory identity provider.
pub struct MemoryIdentity {
    status: Mutex<SessionStatus>,
}

impl MemoryIdentity {
    pub fn authenticated(email: &str) -> Self {
        Self {
            status: Mutex::new(SessionStatus {
                authenticated: true,
                email: Some(email.to_string()),
            }),
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn status(&self) -> SessionStatus {
        self.status.lock().unwrap().clone()
    }

    async fn start(&self) -> Result<()> {
        let mut status = self.status.lock().unwrap();
        status.authenticated = true;
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        let mut status = self.status.lock().unwrap();
        status.authenticated = false;
        status.email = None;
        Ok(())
    }
}
