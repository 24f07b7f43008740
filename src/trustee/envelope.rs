//! Hybrid envelope encryption of Shamir shares for trustees.
//!
//! A share is wrapped for exactly one trustee using X25519-ECDH with an
//! ephemeral sender key, HKDF-SHA256 key derivation, and AES-256-GCM:
//!
//! 1. Generate an ephemeral X25519 key pair.
//! 2. ECDH: `shared_secret = ephemeral_secret * trustee_public`.
//! 3. Derive the wrap key: `HKDF-SHA256(shared_secret, info = "heirvault-share-wrap")`.
//! 4. Encrypt the share with AES-256-GCM under the wrap key.
//!
//! Decryption performs the mirrored ECDH with the trustee's private
//! key.  The envelope has no payload-size ceiling: the asymmetric step
//! only ever wraps a 32-byte symmetric secret, never the share itself.
//!
//! Wrong private key, corrupted ciphertext, and a tampered nonce are
//! indistinguishable at this layer: all fail the authentication tag and
//! surface as `DecryptionFailed`.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::errors::{HeirVaultError, Result};
use crate::vault::format::{base64_decode, base64_encode};

/// HKDF context string binding derived keys to this use.
const WRAP_INFO: &[u8] = b"heirvault-share-wrap";

/// A Shamir share encrypted for one trustee.
///
/// `ephemeral_public` and `nonce` are not secret; together with the
/// trustee's private key they are sufficient to re-derive the wrap key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedShare {
    /// Email of the trustee this share is wrapped for.
    pub trustee_email: String,

    /// The share's x-coordinate within the plan.
    pub share_index: u8,

    /// Ephemeral X25519 public key of the sender (32 bytes).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ephemeral_public: Vec<u8>,

    /// AES-256-GCM nonce (12 bytes).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,

    /// Ciphertext of the share bytes (`index || data`), including the
    /// 16-byte auth tag.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
}

/// Encrypt share bytes so only the holder of `trustee_public`'s private
/// key can read them.
pub fn encrypt_share(
    share_bytes: &[u8],
    share_index: u8,
    trustee_email: &str,
    trustee_public: &PublicKey,
) -> Result<EncryptedShare> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(trustee_public);
    let wrap_key = derive_wrap_key(shared.as_bytes())?;

    let cipher = Aes256Gcm::new_from_slice(wrap_key.as_ref())
        .map_err(|e| HeirVaultError::EncryptionFailed(format!("invalid wrap key: {e}")))?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, share_bytes)
        .map_err(|e| HeirVaultError::EncryptionFailed(format!("share wrap failed: {e}")))?;

    Ok(EncryptedShare {
        trustee_email: trustee_email.to_string(),
        share_index,
        ephemeral_public: ephemeral_public.as_bytes().to_vec(),
        nonce: nonce.to_vec(),
        ciphertext,
    })
}

/// Decrypt a share with the trustee's private key.
pub fn decrypt_share(encrypted: &EncryptedShare, trustee_secret: &StaticSecret) -> Result<Vec<u8>> {
    let ephemeral_bytes: [u8; 32] = encrypted
        .ephemeral_public
        .as_slice()
        .try_into()
        .map_err(|_| HeirVaultError::DecryptionFailed)?;
    let ephemeral_public = PublicKey::from(ephemeral_bytes);

    let shared = trustee_secret.diffie_hellman(&ephemeral_public);
    let wrap_key = derive_wrap_key(shared.as_bytes())?;

    if encrypted.nonce.len() != 12 {
        return Err(HeirVaultError::DecryptionFailed);
    }
    let nonce = Nonce::from_slice(&encrypted.nonce);

    let cipher = Aes256Gcm::new_from_slice(wrap_key.as_ref())
        .map_err(|_| HeirVaultError::DecryptionFailed)?;

    cipher
        .decrypt(nonce, encrypted.ciphertext.as_slice())
        .map_err(|_| HeirVaultError::DecryptionFailed)
}

/// HKDF-SHA256 expand of the ECDH shared secret into an AES-256 key.
fn derive_wrap_key(shared_secret: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(WRAP_INFO, key.as_mut())
        .map_err(|e| HeirVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trustee::keys::TrusteeKeyPair;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let pair = TrusteeKeyPair::generate();
        let share = b"\x01some share bytes";

        let encrypted =
            encrypt_share(share, 1, "alice@example.com", pair.public_key()).unwrap();
        let decrypted = decrypt_share(&encrypted, pair.secret_key()).unwrap();

        assert_eq!(decrypted, share);
        assert_eq!(encrypted.share_index, 1);
        assert_eq!(encrypted.trustee_email, "alice@example.com");
    }

    #[test]
    fn wrong_private_key_fails() {
        let alice = TrusteeKeyPair::generate();
        let mallory = TrusteeKeyPair::generate();

        let encrypted =
            encrypt_share(b"\x01share", 1, "alice@example.com", alice.public_key()).unwrap();
        assert!(decrypt_share(&encrypted, mallory.secret_key()).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let pair = TrusteeKeyPair::generate();
        let mut encrypted =
            encrypt_share(b"\x01share", 1, "a@example.com", pair.public_key()).unwrap();
        encrypted.ciphertext[0] ^= 0xFF;
        assert!(decrypt_share(&encrypted, pair.secret_key()).is_err());
    }

    #[test]
    fn tampered_nonce_fails() {
        let pair = TrusteeKeyPair::generate();
        let mut encrypted =
            encrypt_share(b"\x01share", 1, "a@example.com", pair.public_key()).unwrap();
        encrypted.nonce[0] ^= 0xFF;
        assert!(decrypt_share(&encrypted, pair.secret_key()).is_err());
    }

    #[test]
    fn large_share_has_no_size_ceiling() {
        // RSA-OAEP with a 2048-bit key caps out around 190 bytes; the
        // hybrid envelope must not.
        let pair = TrusteeKeyPair::generate();
        let big = vec![0x5Au8; 4096];

        let encrypted = encrypt_share(&big, 2, "b@example.com", pair.public_key()).unwrap();
        let decrypted = decrypt_share(&encrypted, pair.secret_key()).unwrap();
        assert_eq!(decrypted, big);
    }
}
