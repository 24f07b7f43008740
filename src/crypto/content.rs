//! Per-item content encryption keys (CEKs).
//!
//! Every stored item gets its own fresh random 32-byte CEK.  The item
//! payload is encrypted under the CEK, and the CEK itself is wrapped
//! under the HKDF-derived key-wrapping key from the Vault Master Key.
//! Both layers use AES-256-GCM with fresh nonces, so tampering with
//! either the payload ciphertext or the wrapped key fails loudly.
//!
//! Keeping the CEK per item means rotating the master passphrase only
//! re-wraps each CEK; the (potentially large) payload ciphertext is
//! untouched.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::keys::MasterKey;
use crate::errors::Result;
use crate::vault::format::{base64_decode, base64_encode};

/// Length of a content encryption key (256 bits).
const CEK_LEN: usize = 32;

/// An item payload sealed under its own content key.
///
/// `wrapped_key` is the CEK encrypted under the VMK-derived wrapping
/// key; `ciphertext` is the payload encrypted under the CEK.  Both are
/// `nonce || ciphertext` blobs and serialize as base64 in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedItem {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub wrapped_key: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
}

/// Generate a fresh random content encryption key.
fn generate_content_key() -> Zeroizing<[u8; CEK_LEN]> {
    let mut cek = Zeroizing::new([0u8; CEK_LEN]);
    OsRng.fill_bytes(cek.as_mut());
    cek
}

/// Seal `plaintext` under a fresh CEK, wrapping the CEK under the
/// master key's wrapping key.
pub fn seal(master_key: &MasterKey, plaintext: &[u8]) -> Result<SealedItem> {
    let cek = generate_content_key();

    let ciphertext = encrypt(cek.as_ref(), plaintext)?;

    let mut wrapping_key = master_key.derive_wrapping_key()?;
    let wrapped_key = encrypt(&wrapping_key, cek.as_ref());
    wrapping_key.zeroize();

    Ok(SealedItem {
        wrapped_key: wrapped_key?,
        ciphertext,
    })
}

/// Open a sealed item: unwrap the CEK, then decrypt the payload.
///
/// Fails with `DecryptionFailed` if either the wrapped key or the
/// payload ciphertext has been tampered with, or the master key is
/// wrong.
pub fn open(master_key: &MasterKey, sealed: &SealedItem) -> Result<Vec<u8>> {
    let mut wrapping_key = master_key.derive_wrapping_key()?;
    let cek = decrypt(&wrapping_key, &sealed.wrapped_key);
    wrapping_key.zeroize();

    let cek = Zeroizing::new(cek?);
    decrypt(&cek, &sealed.ciphertext)
}

/// Re-wrap a sealed item's CEK under a new master key.
///
/// The payload ciphertext is carried over unchanged; only the wrapped
/// key is re-encrypted.  Used by passphrase rotation.
pub fn rewrap(
    old_master: &MasterKey,
    new_master: &MasterKey,
    sealed: &SealedItem,
) -> Result<SealedItem> {
    let mut old_wrapping = old_master.derive_wrapping_key()?;
    let cek = decrypt(&old_wrapping, &sealed.wrapped_key);
    old_wrapping.zeroize();
    let cek = Zeroizing::new(cek?);

    let mut new_wrapping = new_master.derive_wrapping_key()?;
    let wrapped_key = encrypt(&new_wrapping, &cek);
    new_wrapping.zeroize();

    Ok(SealedItem {
        wrapped_key: wrapped_key?,
        ciphertext: sealed.ciphertext.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master(byte: u8) -> MasterKey {
        MasterKey::new([byte; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let mk = master(0x41);
        let sealed = seal(&mk, b"deed to the house").unwrap();
        let opened = open(&mk, &sealed).unwrap();
        assert_eq!(opened, b"deed to the house");
    }

    #[test]
    fn open_with_wrong_master_key_fails() {
        let mk = master(0x41);
        let sealed = seal(&mk, b"payload").unwrap();
        assert!(open(&master(0x42), &sealed).is_err());
    }

    #[test]
    fn tampered_wrapped_key_fails() {
        let mk = master(0x41);
        let mut sealed = seal(&mk, b"payload").unwrap();
        let last = sealed.wrapped_key.len() - 1;
        sealed.wrapped_key[last] ^= 0xFF;
        assert!(open(&mk, &sealed).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let mk = master(0x41);
        let mut sealed = seal(&mk, b"payload").unwrap();
        let last = sealed.ciphertext.len() - 1;
        sealed.ciphertext[last] ^= 0xFF;
        assert!(open(&mk, &sealed).is_err());
    }

    #[test]
    fn rewrap_preserves_payload_ciphertext() {
        let old = master(0x41);
        let new = master(0x42);
        let sealed = seal(&old, b"payload").unwrap();

        let rewrapped = rewrap(&old, &new, &sealed).unwrap();
        assert_eq!(rewrapped.ciphertext, sealed.ciphertext);
        assert_ne!(rewrapped.wrapped_key, sealed.wrapped_key);

        assert_eq!(open(&new, &rewrapped).unwrap(), b"payload");
        assert!(open(&old, &rewrapped).is_err());
    }
}
