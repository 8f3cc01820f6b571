//! Encrypted Synchronization Engine
//!
//! This library keeps independently-versioned local data partitions ("sync
//! units") consistent with a remote object store, end-to-end encrypted under
//! a user-supplied password. It provides:
//! - Authenticated envelope encryption (AES-256-GCM over an Argon2id key)
//! - A multi-unit sync orchestrator with per-unit failure isolation
//! - A bounded-retry connectivity prober with an unavailability latch
//! - A push-driven pending-change tracker that gates automatic sync
//! - A bulk scanner/cleaner for remote files that no longer decrypt
//!
//! Transport, identity, credential storage, and password-strength scoring are
//! collaborator traits; the engine never implements them itself.

pub mod crypto;
pub mod password;
pub mod sync;

pub use crypto::envelope::{decrypt, encrypt, SyncEnvelope, ENVELOPE_VERSION};
pub use crypto::CryptoError;
pub use password::{CredentialStore, KeyringStore, PasswordGate, PasswordStrength, StrengthEstimator};
pub use sync::auth::{IdentityProvider, SessionStatus};
pub use sync::cleaner::{DeleteReport, UndecryptableFile, UndecryptableScanner};
pub use sync::local::LocalStore;
pub use sync::orchestrator::{RunSummary, SyncOrchestrator, SyncRequest};
pub use sync::pending::{AutoSyncPolicy, PendingChangeTracker};
pub use sync::prober::{ConnectivityProber, ProbeState};
pub use sync::progress::{LastSyncResult, SyncDirection, SyncProgress, SyncStatus};
pub use sync::remote::{RemoteObject, RemoteStore};
pub use sync::unit::{Scope, SyncBundle};

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// General error type for the sync engine.
///
/// Per-unit errors during a sync run never surface through this type; the
/// orchestrator isolates them into the run's `failed_units` list.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Bad password, tampered envelope, or undersized ciphertext. Always
    /// opaque: callers cannot distinguish a wrong password from corruption.
    #[error("Crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    /// Transient network or remote-store failure. Safe to retry.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Session invalid. Requires re-authentication; never retried here.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// User-correctable policy failure (weak password, vault unavailable).
    #[error("Policy error: {0}")]
    Policy(String),

    /// A second sync run was requested while one was active. Rejected by
    /// design: runs neither queue nor race.
    #[error("A sync run is already in progress")]
    SyncInProgress,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
