//! Identity Provider collaborator contract.
//!
//! The engine starts/ends sessions and re-reads status; the OAuth exchange
//! itself lives outside this crate.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Current session state as reported by the Identity Provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Authenticated-session collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session status.
    async fn status(&self) -> SessionStatus;

    /// Begin the authentication flow. May fail outright; there is no
    /// partial-success concept for this single atomic action.
    async fn start(&self) -> Result<()>;

    /// End the session.
    async fn sign_out(&self) -> Result<()>;
}
