//! Platform credential vault adapter for the sync password.
//!
//! The password is never written to a plaintext file; it lives only in the
//! OS-protected credential store behind the [`CredentialStore`] trait.

use crate::{EngineError, Result};
use async_trait::async_trait;
use zeroize::Zeroize;

/// Opaque secure storage for the sync password.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether the platform vault can currently be reached.
    async fn is_available(&self) -> bool;

    /// Persist the sync password. Fails with a policy error when the
    /// platform vault is inaccessible.
    async fn store(&self, secret: &str) -> Result<()>;

    /// Retrieve the stored sync password, if any.
    async fn retrieve(&self) -> Result<Option<String>>;

    /// Remove the stored sync password. Missing entries are not an error.
    async fn clear(&self) -> Result<()>;
}

/// OS keychain adapter backed by the `keyring` crate.
///
/// Secrets are stored base64-encoded to stay UTF-8 safe across keychain
/// backends.
pub struct KeyringStore {
    service: String,
    account: String,
}

impl KeyringStore {
    pub fn new(service: &str, account: &str) -> Self {
        Self {
            service: service.to_string(),
            account: account.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| EngineError::Policy(format!("Encryption not available: {}", e)))
    }
}

#[async_trait]
impl CredentialStore for KeyringStore {
    async fn is_available(&self) -> bool {
        match self.entry() {
            Ok(entry) => !matches!(
                entry.get_password(),
                Err(keyring::Error::PlatformFailure(_)) | Err(keyring::Error::NoStorageAccess(_))
            ),
            Err(_) => false,
        }
    }

    async fn store(&self, secret: &str) -> Result<()> {
        use base64::Engine;

        let entry = self.entry()?;
        let mut encoded = base64::engine::general_purpose::STANDARD.encode(secret.as_bytes());
        let result = entry
            .set_password(&encoded)
            .map_err(|e| EngineError::Policy(format!("Encryption not available: {}", e)));
        encoded.zeroize();
        result
    }

    async fn retrieve(&self) -> Result<Option<String>> {
        use base64::Engine;

        let entry = self.entry()?;
        let mut encoded = match entry.get_password() {
            Ok(value) => value,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => {
                return Err(EngineError::Policy(format!(
                    "Encryption not available: {}",
                    e
                )))
            }
        };

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| EngineError::Policy(format!("Stored sync password is invalid: {}", e)));
        encoded.zeroize();

        let bytes = decoded?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| EngineError::Policy("Stored sync password is invalid".to_string()))
    }

    async fn clear(&self) -> Result<()> {
        let entry = self.entry()?;
        if let Err(e) = entry.delete_password() {
            if matches!(e, keyring::Error::NoEntry) {
                return Ok(());
            }
            return Err(EngineError::Policy(format!(
                "Failed to clear sync password: {}",
                e
            )));
        }
        Ok(())
    }
}
