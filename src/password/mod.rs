//! Sync-password policy and secure storage.

pub mod gate;
pub mod vault;

pub use gate::{PasswordGate, PasswordStrength, StrengthEstimator};
pub use vault::{CredentialStore, KeyringStore};
