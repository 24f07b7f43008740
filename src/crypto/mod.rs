//! Cryptographic primitives for HeirVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Argon2id passphrase-based master-key derivation (`kdf`)
//! - The `MasterKey` wrapper and HKDF sub-key derivation (`keys`)
//! - Per-item content keys wrapped under the master key (`content`)

pub mod content;
pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_master_key, ...};
pub use content::{open, rewrap, seal, SealedItem};
pub use encryption::{decrypt, encrypt};
pub use kdf::{derive_master_key, derive_master_key_with_params, generate_salt, Argon2Params};
pub use keys::{derive_hmac_key, derive_wrapping_key, MasterKey};
