//! Sync-password strength policy over the Strength Estimator collaborator.
//!
//! The engine does not score passwords itself; it consumes a 0-4 score plus
//! feedback strings and enforces the set/change policy.

use crate::password::vault::CredentialStore;
use crate::{EngineError, Result};
use std::sync::Arc;
use tracing::warn;

/// Minimum score (0-4 scale) required to set or change the sync password.
pub const MIN_SCORE_TO_SET: u8 = 4;

/// Scores below this are surfaced to the user as clearly weak.
pub const CLEARLY_WEAK_BELOW: u8 = 3;

/// Strength verdict produced by the Strength Estimator collaborator.
#[derive(Debug, Clone)]
pub struct PasswordStrength {
    /// Score on a 0-4 scale.
    pub score: u8,
    /// Human-readable feedback for weak passwords.
    pub feedback: Vec<String>,
}

impl PasswordStrength {
    /// Whether this score is below the clearly-weak threshold.
    pub fn is_clearly_weak(&self) -> bool {
        self.score < CLEARLY_WEAK_BELOW
    }
}

/// Password-strength scoring collaborator.
pub trait StrengthEstimator: Send + Sync {
    fn score(&self, password: &str) -> PasswordStrength;
}

/// Strength policy plus vault access for the sync password.
pub struct PasswordGate {
    estimator: Arc<dyn StrengthEstimator>,
    vault: Arc<dyn CredentialStore>,
}

impl PasswordGate {
    pub fn new(estimator: Arc<dyn StrengthEstimator>, vault: Arc<dyn CredentialStore>) -> Self {
        Self { estimator, vault }
    }

    /// Score a candidate password via the Strength Estimator.
    pub fn check_strength(&self, password: &str) -> PasswordStrength {
        self.estimator.score(password)
    }

    /// Set or change the sync password.
    ///
    /// Only passwords scoring the maximum (4) may be stored; anything less
    /// fails with a policy error carrying the estimator's feedback.
    pub async fn store_password(&self, password: &str) -> Result<()> {
        let strength = self.check_strength(password);
        if strength.score < MIN_SCORE_TO_SET {
            warn!(score = strength.score, "rejected weak sync password");
            let detail = if strength.feedback.is_empty() {
                "choose a stronger password".to_string()
            } else {
                strength.feedback.join("; ")
            };
            return Err(EngineError::Policy(format!(
                "Password too weak (score {}/4): {}",
                strength.score, detail
            )));
        }

        self.vault.store(password).await
    }

    /// Retrieve the stored sync password, if any.
    pub async fn retrieve_password(&self) -> Result<Option<String>> {
        self.vault.retrieve().await
    }

    /// Remove the stored sync password.
    pub async fn clear_password(&self) -> Result<()> {
        self.vault.clear().await
    }

    /// Whether a sync password is currently stored. Reports `false` rather
    /// than erroring when the platform vault is inaccessible.
    pub async fn has_stored_password(&self) -> bool {
        matches!(self.vault.retrieve().await, Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedEstimator {
        score: u8,
        feedback: Vec<String>,
    }

    impl StrengthEstimator for FixedEstimator {
        fn score(&self, _password: &str) -> PasswordStrength {
            PasswordStrength {
                score: self.score,
                feedback: self.feedback.clone(),
            }
        }
    }

    struct MemoryVault {
        secret: Mutex<Option<String>>,
        available: bool,
    }

    impl MemoryVault {
        fn new(available: bool) -> Self {
            Self {
                secret: Mutex::new(None),
                available,
            }
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryVault {
        async fn is_available(&self) -> bool {
            self.available
        }

        async fn store(&self, secret: &str) -> Result<()> {
            if !self.available {
                return Err(EngineError::Policy("Encryption not available".to_string()));
            }
            *self.secret.lock().unwrap() = Some(secret.to_string());
            Ok(())
        }

        async fn retrieve(&self) -> Result<Option<String>> {
            if !self.available {
                return Err(EngineError::Policy("Encryption not available".to_string()));
            }
            Ok(self.secret.lock().unwrap().clone())
        }

        async fn clear(&self) -> Result<()> {
            *self.secret.lock().unwrap() = None;
            Ok(())
        }
    }

    fn gate(score: u8, feedback: Vec<String>, available: bool) -> PasswordGate {
        PasswordGate::new(
            Arc::new(FixedEstimator { score, feedback }),
            Arc::new(MemoryVault::new(available)),
        )
    }

    #[tokio::test]
    async fn strong_password_is_stored() {
        let gate = gate(4, vec![], true);
        gate.store_password("test-password-strong-123!").await.unwrap();
        assert!(gate.has_stored_password().await);
        assert_eq!(
            gate.retrieve_password().await.unwrap().as_deref(),
            Some("test-password-strong-123!")
        );
    }

    #[tokio::test]
    async fn score_below_four_is_rejected_with_feedback() {
        let gate = gate(3, vec!["Add another word".to_string()], true);
        let err = gate.store_password("okish-password").await.unwrap_err();
        match err {
            EngineError::Policy(msg) => {
                assert!(msg.contains("score 3/4"));
                assert!(msg.contains("Add another word"));
            }
            other => panic!("expected policy error, got {:?}", other),
        }
        assert!(!gate.has_stored_password().await);
    }

    #[tokio::test]
    async fn clearly_weak_threshold() {
        assert!(PasswordStrength {
            score: 2,
            feedback: vec![]
        }
        .is_clearly_weak());
        assert!(!PasswordStrength {
            score: 3,
            feedback: vec![]
        }
        .is_clearly_weak());
    }

    #[tokio::test]
    async fn unavailable_vault_fails_store_and_reports_no_password() {
        let gate = gate(4, vec![], false);
        let err = gate.store_password("test-password-strong-123!").await.unwrap_err();
        assert!(matches!(err, EngineError::Policy(_)));
        // has_stored_password must report false rather than erroring
        assert!(!gate.has_stored_password().await);
    }

    #[tokio::test]
    async fn clear_then_absent() {
        let gate = gate(4, vec![], true);
        gate.store_password("test-password-strong-123!").await.unwrap();
        gate.clear_password().await.unwrap();
        assert!(!gate.has_stored_password().await);
    }
}
