//! Sync orchestrator: drives per-unit upload/download runs.
//!
//! One run is in flight at most; a second request is rejected, never queued
//! or raced. Per-unit failures are isolated into the run's failed-unit list
//! and never abort the loop. The terminal event is retained as the last sync
//! result; the transient progress clears three seconds later.

use crate::crypto::envelope::{decrypt, encrypt};
use crate::sync::auth::{IdentityProvider, SessionStatus};
use crate::sync::local::LocalStore;
use crate::sync::progress::{
    LastSyncResult, ProgressChannel, SyncDirection, SyncProgress, SyncStatus,
};
use crate::sync::remote::RemoteStore;
use crate::sync::unit::Scope;
use crate::{EngineError, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// How long the transient progress survives after a terminal event.
const TRANSIENT_CLEAR_DELAY: Duration = Duration::from_secs(3);

/// One sync request: a direction applied to a scope.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub direction: SyncDirection,
    pub scope: Scope,
}

/// Aggregate outcome of a run, also delivered as the terminal progress event.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub status: SyncStatus,
    pub message: Option<String>,
    pub failed_units: Vec<String>,
}

struct RunState {
    active: bool,
    run_seq: u64,
    current: Option<SyncProgress>,
    last_result: Option<LastSyncResult>,
}

/// Clears the active flag when a run ends, however it ends.
struct RunGuard {
    state: Arc<Mutex<RunState>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.state.lock().unwrap().active = false;
    }
}

/// Drives multi-unit sync runs against the collaborator stores.
pub struct SyncOrchestrator {
    remote: Arc<dyn RemoteStore>,
    local: Arc<dyn LocalStore>,
    identity: Arc<dyn IdentityProvider>,
    progress: ProgressChannel,
    state: Arc<Mutex<RunState>>,
}

impl SyncOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        local: Arc<dyn LocalStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            remote,
            local,
            identity,
            progress: ProgressChannel::default(),
            state: Arc::new(Mutex::new(RunState {
                active: false,
                run_seq: 0,
                current: None,
                last_result: None,
            })),
        }
    }

    /// Subscribe to progress events (UI, connectivity prober).
    pub fn subscribe_progress(&self) -> broadcast::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    /// The transient progress of the current or just-finished run.
    pub fn current_progress(&self) -> Option<SyncProgress> {
        self.state.lock().unwrap().current.clone()
    }

    /// The retained outcome of the last completed run.
    pub fn last_result(&self) -> Option<LastSyncResult> {
        self.state.lock().unwrap().last_result.clone()
    }

    /// Current session status from the Identity Provider.
    pub async fn session_status(&self) -> SessionStatus {
        self.identity.status().await
    }

    /// Begin the authentication flow and report the resulting status.
    pub async fn start_auth(&self) -> Result<SessionStatus> {
        self.identity.start().await?;
        Ok(self.identity.status().await)
    }

    /// End the session and drop all retained sync state.
    pub async fn sign_out(&self) -> Result<()> {
        self.identity.sign_out().await?;
        let mut state = self.state.lock().unwrap();
        state.current = None;
        state.last_result = None;
        Ok(())
    }

    /// Run one sync. Rejects with [`EngineError::SyncInProgress`] when a run
    /// is already active.
    pub async fn sync_now(&self, request: SyncRequest, password: &str) -> Result<RunSummary> {
        let run_seq = {
            let mut state = self.state.lock().unwrap();
            if state.active {
                return Err(EngineError::SyncInProgress);
            }
            state.active = true;
            state.run_seq += 1;
            state.run_seq
        };
        let _guard = RunGuard {
            state: self.state.clone(),
        };

        info!(direction = ?request.direction, scope = ?request.scope, "sync run started");

        let (units, listing_warning) = match self.resolve_units(&request).await {
            Ok(resolved) => resolved,
            Err(e) => {
                return Ok(self.finish(
                    run_seq,
                    request.direction,
                    SyncStatus::Error,
                    Some(format!("Could not resolve sync units: {}", e)),
                    Vec::new(),
                ));
            }
        };

        if units.is_empty() {
            let message = match listing_warning {
                Some(w) => format!("No sync units to process. {}", w),
                None => "No sync units to process".to_string(),
            };
            return Ok(self.finish(
                run_seq,
                request.direction,
                SyncStatus::Error,
                Some(message),
                Vec::new(),
            ));
        }

        let total = units.len();
        let mut failed_units = Vec::new();

        for (index, unit) in units.iter().enumerate() {
            let event = SyncProgress::unit(request.direction, unit, index + 1, total);
            self.state.lock().unwrap().current = Some(event.clone());
            self.progress.emit(event);

            let result = match request.direction {
                SyncDirection::Download => self.download_unit(unit, password).await,
                SyncDirection::Upload => self.upload_unit(unit, password).await,
            };

            if let Err(e) = result {
                warn!(unit = %unit, error = %e, "sync unit failed");
                failed_units.push(unit.clone());
            }
        }

        let (status, mut message) = if failed_units.is_empty() {
            (SyncStatus::Success, None)
        } else if failed_units.len() == total {
            (
                SyncStatus::Error,
                Some(format!("All {} sync units failed", total)),
            )
        } else {
            (
                SyncStatus::Partial,
                Some(format!("{}/{} sync units failed", failed_units.len(), total)),
            )
        };
        if let Some(warning) = listing_warning {
            message = Some(match message {
                Some(m) => format!("{}. {}", m, warning),
                None => warning,
            });
        }

        Ok(self.finish(run_seq, request.direction, status, message, failed_units))
    }

    /// Resolve the scope to concrete units. The warning, when present,
    /// records that the remote listing failed and the run covers local units
    /// only; it is carried into the terminal event's message.
    async fn resolve_units(&self, request: &SyncRequest) -> Result<(Vec<String>, Option<String>)> {
        let mut units = request.scope.resolve(self.local.as_ref()).await?;
        let mut warning = None;

        // A full download must also reach units that exist only remotely,
        // e.g. restoring onto a fresh device.
        if request.direction == SyncDirection::Download && request.scope == Scope::All {
            match self.remote.list_objects().await {
                Ok(objects) => {
                    for object in objects {
                        if let Some(envelope) = object.envelope {
                            if !units.contains(&envelope.sync_unit) {
                                units.push(envelope.sync_unit);
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "remote listing failed; downloading local units only");
                    warning = Some(
                        "Remote listing failed; remote-only units were not restored".to_string(),
                    );
                }
            }
        }

        Ok((units, warning))
    }

    async fn download_unit(&self, unit: &str, password: &str) -> Result<()> {
        match self.remote.get_envelope(unit).await? {
            Some(envelope) => {
                let payload = decrypt(&envelope, password)?;
                self.local.apply_unit(unit, payload).await
            }
            None => {
                debug!(unit = %unit, "no remote envelope, skipping");
                Ok(())
            }
        }
    }

    async fn upload_unit(&self, unit: &str, password: &str) -> Result<()> {
        match self.local.load_unit(unit).await? {
            Some(payload) => {
                let envelope = encrypt(&payload, password, unit)?;
                self.remote.put_envelope(unit, &envelope).await
            }
            None => {
                debug!(unit = %unit, "no local state, skipping");
                Ok(())
            }
        }
    }

    /// Emit the terminal event, retain it as the last result, and schedule
    /// the transient progress to clear.
    fn finish(
        &self,
        run_seq: u64,
        direction: SyncDirection,
        status: SyncStatus,
        message: Option<String>,
        failed_units: Vec<String>,
    ) -> RunSummary {
        let terminal = SyncProgress::terminal(direction, status, message.clone(), failed_units.clone());

        {
            let mut state = self.state.lock().unwrap();
            state.last_result = Some(LastSyncResult::from_terminal(&terminal));
            state.current = Some(terminal.clone());
        }
        self.progress.emit(terminal);
        info!(?status, failed = failed_units.len(), "sync run finished");

        let state = self.state.clone();
        let progress = self.progress.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TRANSIENT_CLEAR_DELAY).await;
            let mut state = state.lock().unwrap();
            // A newer run owns the transient state now.
            if state.run_seq == run_seq {
                state.current = None;
                progress.emit(SyncProgress::idle(direction));
            }
        });

        RunSummary {
            status,
            message,
            failed_units,
        }
    }
}
