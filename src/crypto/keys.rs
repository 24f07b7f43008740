//! The Vault Master Key and its HKDF-SHA256 sub-keys.
//!
//! From the single master key (VMK) we derive:
//! - A dedicated **key-wrapping key** used to wrap per-item content keys.
//! - A dedicated **HMAC key** for vault integrity checks.
//!
//! HKDF (RFC 5869) uses the master key as input keying material (IKM)
//! and a context string (`info`) to produce independent sub-keys.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{HeirVaultError, Result};

/// Length of derived sub-keys (256 bits).
const KEY_LEN: usize = 32;

/// Derive the content-key wrapping key from the master key.
///
/// Per-item content keys (CEKs) are encrypted under this key rather
/// than the raw VMK, so the VMK itself only ever feeds HKDF and the
/// sharing engine.
pub fn derive_wrapping_key(master_key: &[u8]) -> Result<[u8; KEY_LEN]> {
    hkdf_derive(master_key, b"heirvault-cek-wrap")
}

/// Derive an HMAC key from the master key.
///
/// This key is used to compute an HMAC over the vault file so we can
/// detect tampering (or a wrong passphrase) before trusting its data.
pub fn derive_hmac_key(master_key: &[u8]) -> Result<[u8; KEY_LEN]> {
    hkdf_derive(master_key, b"heirvault-hmac-key")
}

/// Internal helper: run HKDF-SHA256 expand with the given `info`.
///
/// We skip the `extract` step and use the master key directly as the
/// pseudo-random key (PRK), because the master key already has high
/// entropy (it came from Argon2id).
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| HeirVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// The Vault Master Key: a 32-byte key that automatically zeroes its
/// memory when dropped.
///
/// Held only in volatile memory for the duration of a command.  The raw
/// bytes are exposed through `as_bytes` solely to feed HKDF and the
/// secret-sharing engine; they are never persisted in plaintext.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to pass to HKDF or the sharing
    /// engine for splitting).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive the content-key wrapping key from this master key.
    pub fn derive_wrapping_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_wrapping_key(&self.bytes)
    }

    /// Derive the vault HMAC key from this master key.
    pub fn derive_hmac_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_hmac_key(&self.bytes)
    }
}
