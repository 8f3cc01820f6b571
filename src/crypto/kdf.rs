//! Argon2id key derivation for the sync password.
//!
//! Every encrypt/decrypt call derives a fresh 256-bit key from the password
//! and the envelope's salt. The key lives only for the duration of the call
//! and is zeroized on drop; nothing is cached across calls.

use crate::crypto::{CryptoError, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::ZeroizeOnDrop;

/// Memory cost in KiB (19 MiB). The sync engine derives a key per call, so
/// the cost targets interactive latency rather than vault-unlock hardening.
const MEM_COST_KIB: u32 = 19_456;

/// Time cost (iterations)
const TIME_COST: u32 = 2;

/// Parallelism (lanes)
const PARALLELISM: u32 = 1;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// A symmetric key derived from the sync password.
///
/// Held in memory only transiently; zeroized when dropped.
#[derive(ZeroizeOnDrop)]
pub struct SyncKey {
    key: [u8; 32],
}

impl SyncKey {
    /// Get a reference to the key bytes (use sparingly)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

/// Derive a 256-bit sync key from a password and salt using Argon2id.
pub fn derive_sync_key(password: &str, salt: &[u8]) -> Result<SyncKey> {
    if salt.len() < 8 {
        return Err(CryptoError::KdfFailed(format!(
            "Salt too short: {} bytes (minimum: 8)",
            salt.len()
        )));
    }

    let params = Params::new(MEM_COST_KIB, TIME_COST, PARALLELISM, Some(32))
        .map_err(|e| CryptoError::KdfFailed(format!("Invalid parameters: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| CryptoError::KdfFailed(format!("Hashing failed: {}", e)))?;

    Ok(SyncKey { key })
}
