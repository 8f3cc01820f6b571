//! Pending-change tracking and auto-sync gating.
//!
//! The dirty bit is initialized by a one-time fetch and thereafter updated
//! exclusively by push notifications from the local-storage watcher; the
//! tracker never polls. Auto-sync fires only on a newly observed trigger
//! condition with the full policy satisfied, never on "pending changes
//! exist" alone.

use crate::sync::local::LocalStore;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Conditions the UI layer supplies when asking whether to auto-sync.
#[derive(Debug, Clone, Copy)]
pub struct AutoSyncPolicy {
    pub auto_sync_enabled: bool,
    pub authenticated: bool,
    pub password_configured: bool,
}

/// Push-driven dirty-state tracker and auto-sync gate.
pub struct PendingChangeTracker {
    has_pending: watch::Sender<bool>,
    trigger_armed: AtomicBool,
    scheduled: Mutex<Option<CancellationToken>>,
    cancel: CancellationToken,
}

impl PendingChangeTracker {
    /// Fetch the initial dirty state once and subscribe to the watcher.
    pub async fn new(local: &dyn LocalStore) -> Result<Arc<Self>> {
        let initial = local.has_pending_changes().await?;
        let (has_pending, _) = watch::channel(initial);

        let tracker = Arc::new(Self {
            has_pending,
            trigger_armed: AtomicBool::new(false),
            scheduled: Mutex::new(None),
            cancel: CancellationToken::new(),
        });
        tracker.clone().spawn_watcher(local.watch_pending());
        Ok(tracker)
    }

    fn spawn_watcher(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(pending) => {
                            debug!(pending, "pending-change notification");
                            self.has_pending.send_if_modified(|current| {
                                let changed = *current != pending;
                                *current = pending;
                                changed
                            });
                        }
                        None => break,
                    }
                }
            }
        })
    }

    /// Current aggregate dirty state.
    pub fn has_pending_changes(&self) -> bool {
        *self.has_pending.borrow()
    }

    /// Subscribe to dirty-state changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.has_pending.subscribe()
    }

    /// Record a newly observed trigger condition (e.g. the first hardware
    /// connection since the tracker was last reset).
    pub fn arm_trigger(&self) {
        self.trigger_armed.store(true, Ordering::SeqCst);
    }

    /// Disarm the trigger (sign-out, settings reset).
    pub fn reset(&self) {
        self.trigger_armed.store(false, Ordering::SeqCst);
    }

    /// Whether an automatic sync should fire now. Consumes the armed trigger
    /// only when every policy condition holds, so an unmet condition leaves
    /// the trigger pending for later.
    pub fn should_auto_sync(&self, policy: &AutoSyncPolicy) -> bool {
        if !policy.auto_sync_enabled || !policy.authenticated || !policy.password_configured {
            return false;
        }
        self.trigger_armed.swap(false, Ordering::SeqCst)
    }

    /// Schedule an auto-sync to fire after `delay`. Replaces any previously
    /// scheduled one.
    pub fn schedule(&self, delay: Duration, on_fire: impl FnOnce() + Send + 'static) {
        let token = CancellationToken::new();
        if let Some(previous) = self.scheduled.lock().unwrap().replace(token.clone()) {
            previous.cancel();
        }

        let parent = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = parent.cancelled() => {}
                _ = tokio::time::sleep(delay) => on_fire(),
            }
        });
    }

    /// Cancel a scheduled-but-not-yet-started auto-sync. A run already in
    /// progress is not cancellable.
    pub fn cancel_pending(&self) {
        if let Some(token) = self.scheduled.lock().unwrap().take() {
            token.cancel();
        }
    }

    /// Stop the watcher task and any scheduled sync.
    pub fn shutdown(&self) {
        self.cancel_pending();
        self.cancel.cancel();
    }
}
