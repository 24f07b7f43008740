//! Trustee key management.
//!
//! This module provides:
//! - X25519 trustee key pairs with PEM armor import/export (`keys`)
//! - Hybrid envelope encryption of Shamir shares (`envelope`)
//! - Secure private-key storage with owner/trustee domains (`keystore`)

pub mod envelope;
pub mod keys;
pub mod keystore;

// Re-export the most commonly used items.
pub use envelope::{decrypt_share, encrypt_share, EncryptedShare};
pub use keys::{import_private_key, import_public_key, TrusteeKeyPair};
pub use keystore::{FileKeyStore, KeyDomain, SecureKeyStore};
