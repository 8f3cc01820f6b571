//! Connectivity prober: bounded-retry check of the remote password marker.
//!
//! Distinguishes "first-time setup" (no remote password marker) from "an
//! existing remote account with a possibly-different password". Three
//! attempts, a fixed 2000 ms delay between them (deliberately not
//! exponential), then the unavailability latch sticks until an explicit
//! retry, a successful network touch by the orchestrator, or sign-out.

use crate::sync::progress::{SyncProgress, SyncStatus};
use crate::sync::remote::RemoteStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Number of remote-check attempts before latching unavailable.
pub const PROBE_ATTEMPTS: u32 = 3;

/// Fixed delay between failed attempts.
pub const PROBE_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Observable prober state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeState {
    /// Whether the remote side holds a password-verification marker.
    /// `None` until a probe succeeds.
    pub has_remote_password: Option<bool>,
    /// Latched after the retry budget is exhausted; needs manual re-arming.
    pub sync_unavailable: bool,
}

/// Probes remote connectivity independently of the sync orchestrator.
pub struct ConnectivityProber {
    remote: Arc<dyn RemoteStore>,
    state_tx: watch::Sender<ProbeState>,
    cancel: CancellationToken,
    /// Token for the probe currently allowed to write state. Rotated on
    /// sign-out and manual retry so a stale in-flight probe cannot publish
    /// its result after a reset.
    probe_cancel: Mutex<CancellationToken>,
}

impl ConnectivityProber {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        let (state_tx, _) = watch::channel(ProbeState::default());
        let cancel = CancellationToken::new();
        let probe_cancel = Mutex::new(cancel.child_token());
        Self {
            remote,
            state_tx,
            cancel,
            probe_cancel,
        }
    }

    /// Cancel any in-flight probe and install a fresh token for the next one.
    fn rotate_probe_token(&self) {
        let mut guard = self.probe_cancel.lock().unwrap();
        guard.cancel();
        *guard = self.cancel.child_token();
    }

    /// Current prober state.
    pub fn state(&self) -> ProbeState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn watch(&self) -> watch::Receiver<ProbeState> {
        self.state_tx.subscribe()
    }

    /// Run the bounded-retry probe. A no-op when the marker is already known
    /// or the prober is latched unavailable.
    pub async fn probe(&self) -> ProbeState {
        {
            let state = self.state_tx.borrow().clone();
            if state.sync_unavailable || state.has_remote_password.is_some() {
                return state;
            }
        }
        let token = self.probe_cancel.lock().unwrap().clone();

        for attempt in 1..=PROBE_ATTEMPTS {
            tokio::select! {
                biased;
                _ = token.cancelled() => return self.state(),
                result = self.remote.has_password_marker() => match result {
                    Ok(found) => {
                        // A reset since this probe started makes its result
                        // stale; drop it instead of resurrecting old state.
                        if token.is_cancelled() {
                            return self.state();
                        }
                        info!(attempt, found, "remote password check succeeded");
                        self.state_tx.send_modify(|s| {
                            s.has_remote_password = Some(found);
                            s.sync_unavailable = false;
                        });
                        return self.state();
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "remote password check failed");
                        if attempt < PROBE_ATTEMPTS {
                            tokio::select! {
                                biased;
                                _ = token.cancelled() => return self.state(),
                                _ = tokio::time::sleep(PROBE_RETRY_DELAY) => {}
                            }
                        }
                    }
                }
            }
        }

        if token.is_cancelled() {
            return self.state();
        }
        warn!("remote password check exhausted retries; sync unavailable");
        self.state_tx.send_modify(|s| {
            s.has_remote_password = None;
            s.sync_unavailable = true;
        });
        self.state()
    }

    /// Reset the latch and probe again.
    pub async fn retry_remote_check(&self) -> ProbeState {
        self.rotate_probe_token();
        self.state_tx.send_modify(|s| {
            s.has_remote_password = None;
            s.sync_unavailable = false;
        });
        self.probe().await
    }

    /// Side-channel recovery: the orchestrator reaching the network proves
    /// connectivity has returned.
    pub fn note_progress(&self, progress: &SyncProgress) {
        if progress.status == SyncStatus::Syncing && self.state_tx.borrow().sync_unavailable {
            info!("sync activity observed; clearing unavailability latch");
            self.state_tx.send_modify(|s| s.sync_unavailable = false);
        }
    }

    /// Feed orchestrator progress events into the prober until shutdown.
    pub fn spawn_progress_listener(
        self: &Arc<Self>,
        mut rx: broadcast::Receiver<SyncProgress>,
    ) -> JoinHandle<()> {
        let prober = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = prober.cancel.cancelled() => break,
                    event = rx.recv() => match event {
                        Ok(progress) => prober.note_progress(&progress),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        })
    }

    /// Sign-out cancels any probe still in flight, then resets both fields.
    pub fn on_sign_out(&self) {
        self.rotate_probe_token();
        self.state_tx.send_modify(|s| {
            s.has_remote_password = None;
            s.sync_unavailable = false;
        });
    }

    /// Cancel any in-flight probe and the progress listener.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
