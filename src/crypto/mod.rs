//! Cryptographic primitives for the sync engine.
//!
//! This module provides:
//! - Argon2id password-based key derivation
//! - AES-256-GCM envelope encryption/decryption with AAD binding

pub mod envelope;
pub mod kdf;

pub use envelope::{decrypt, encrypt, SyncEnvelope, ENVELOPE_VERSION};
pub use kdf::{derive_sync_key, SyncKey};

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Key derivation failed: {0}")]
    KdfFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Ciphertext too short")]
    CiphertextTooShort,

    #[error("Invalid nonce: {0}")]
    InvalidNonce(String),

    #[error("Authentication failed - data may have been tampered with")]
    AuthenticationFailed,
}

/// Result type for crypto operations
pub type Result<T> = std::result::Result<T, CryptoError>;
