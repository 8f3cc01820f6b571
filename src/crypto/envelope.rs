//! Envelope encryption: authenticated encryption of one sync unit's payload.
//!
//! An envelope carries `salt(16) || iv(12) || ciphertext || auth_tag(16)` as
//! separate base64 fields plus cleartext metadata. The envelope `version` and
//! `syncUnit` are bound into the GCM tag as associated authenticated data, so
//! mutating either after the fact fails decryption even when the ciphertext
//! itself is untouched.

use crate::crypto::kdf::{derive_sync_key, SALT_LEN};
use crate::crypto::{CryptoError, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current envelope wire-format version.
pub const ENVELOPE_VERSION: u32 = 1;

/// GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// The wire/storage representation of one sync unit's encrypted state.
///
/// `salt` and `iv` are freshly random on every encryption, so encrypting
/// identical plaintext twice never yields identical envelopes. `updatedAt`
/// is the encryption instant and the only ordering signal the storage layer
/// sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEnvelope {
    /// Wire-format version, bound as AAD.
    pub version: u32,
    /// Name of the sync unit this envelope belongs to, bound as AAD.
    pub sync_unit: String,
    /// Encryption instant (ISO-8601).
    pub updated_at: DateTime<Utc>,
    /// Argon2id salt (16 bytes).
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
    /// AES-GCM nonce (12 bytes).
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    /// Ciphertext with the 16-byte auth tag appended.
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
}

/// Associated data binding the envelope metadata into the auth tag.
fn aad_for(version: u32, sync_unit: &str) -> Vec<u8> {
    format!("v{}:{}", version, sync_unit).into_bytes()
}

/// Encrypt a sync unit's serialized payload under the sync password.
///
/// Generates a fresh salt and IV, derives a key with Argon2id, and seals the
/// plaintext with AES-256-GCM. The empty string is a valid payload.
pub fn encrypt(plaintext: &str, password: &str, sync_unit: &str) -> Result<SyncEnvelope> {
    let salt: [u8; SALT_LEN] = rand::random();
    let key = derive_sync_key(password, &salt)?;

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let nonce_bytes: [u8; 12] = nonce.into();

    let aad = aad_for(ENVELOPE_VERSION, sync_unit);
    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad: &aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(format!("Envelope encryption failed: {}", e)))?;

    Ok(SyncEnvelope {
        version: ENVELOPE_VERSION,
        sync_unit: sync_unit.to_string(),
        updated_at: Utc::now(),
        salt: salt.to_vec(),
        iv: nonce_bytes.to_vec(),
        ciphertext,
    })
}

/// Decrypt an envelope back to the unit's serialized payload.
///
/// Fails opaquely on a wrong password, a tampered ciphertext, or a mutated
/// `version`/`syncUnit`; no partial plaintext is ever returned.
pub fn decrypt(envelope: &SyncEnvelope, password: &str) -> Result<String> {
    if envelope.ciphertext.len() < TAG_LEN {
        return Err(CryptoError::CiphertextTooShort);
    }

    let nonce_bytes: [u8; 12] = envelope
        .iv
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidNonce(format!("Invalid IV length: {}", envelope.iv.len())))?;

    let key = derive_sync_key(password, &envelope.salt)?;
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Nonce::from(nonce_bytes);

    let aad = aad_for(envelope.version, &envelope.sync_unit);
    let plaintext = cipher
        .decrypt(
            &nonce,
            Payload {
                msg: &envelope.ciphertext,
                aad: &aad,
            },
        )
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::DecryptionFailed("Plaintext is not valid UTF-8".to_string()))
}

/// Base64 (standard alphabet) serialization for binary envelope fields.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Vec<u8>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
