//! Trustee asymmetric key pairs.
//!
//! Each trustee holds an X25519 static key pair.  The public half is
//! shared with the vault owner (who uses it to wrap that trustee's
//! Shamir share); the private half must never leave the trustee's
//! custody.  Keys travel as PEM-style armor so they can be pasted into
//! email or printed.

use aes_gcm::aead::OsRng;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::errors::{HeirVaultError, Result};

/// Raw X25519 key length.
const KEY_LEN: usize = 32;

const PUBLIC_LABEL: &str = "HEIRVAULT PUBLIC KEY";
const PRIVATE_LABEL: &str = "HEIRVAULT PRIVATE KEY";

/// A trustee's key pair.
///
/// The secret half zeroizes on drop (via `x25519-dalek`).
pub struct TrusteeKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl TrusteeKeyPair {
    /// Generate a fresh random key pair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Rebuild a key pair from a stored private key.
    pub fn from_secret(secret: StaticSecret) -> Self {
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret_key(&self) -> &StaticSecret {
        &self.secret
    }

    /// PEM armor of the public key.
    pub fn public_key_pem(&self) -> String {
        export_public_key_pem(&self.public)
    }

    /// PEM armor of the private key.  Handle with care.
    pub fn private_key_pem(&self) -> String {
        armor(PRIVATE_LABEL, self.secret.as_bytes())
    }
}

/// PEM armor for a standalone public key.
pub fn export_public_key_pem(public: &PublicKey) -> String {
    armor(PUBLIC_LABEL, public.as_bytes())
}

/// Parse a PEM-armored trustee public key.
pub fn import_public_key(pem: &str) -> Result<PublicKey> {
    let bytes = dearmor(PUBLIC_LABEL, pem)?;
    Ok(PublicKey::from(bytes))
}

/// Parse a PEM-armored trustee private key.
pub fn import_private_key(pem: &str) -> Result<StaticSecret> {
    let bytes = dearmor(PRIVATE_LABEL, pem)?;
    Ok(StaticSecret::from(bytes))
}

/// Wrap raw key bytes in `-----BEGIN <label>-----` armor.
fn armor(label: &str, bytes: &[u8; KEY_LEN]) -> String {
    format!(
        "-----BEGIN {label}-----\n{}\n-----END {label}-----\n",
        BASE64.encode(bytes)
    )
}

/// Strip armor and decode exactly 32 key bytes.
fn dearmor(label: &str, pem: &str) -> Result<[u8; KEY_LEN]> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let mut body = String::new();
    let mut inside = false;
    let mut saw_begin = false;
    let mut saw_end = false;

    for line in pem.lines() {
        let line = line.trim();
        if line == begin {
            saw_begin = true;
            inside = true;
        } else if line == end {
            saw_end = true;
            inside = false;
        } else if inside {
            body.push_str(line);
        }
    }

    if !saw_begin || !saw_end {
        return Err(HeirVaultError::KeyImport(format!(
            "missing {label} armor markers"
        )));
    }

    let decoded = BASE64
        .decode(body.as_bytes())
        .map_err(|e| HeirVaultError::KeyImport(format!("invalid base64 in {label}: {e}")))?;

    let bytes: [u8; KEY_LEN] = decoded.try_into().map_err(|v: Vec<u8>| {
        HeirVaultError::KeyImport(format!(
            "{label} must decode to {KEY_LEN} bytes, got {}",
            v.len()
        ))
    })?;

    Ok(bytes)
}
