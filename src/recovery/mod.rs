//! Owner-only recovery kits.
//!
//! A recovery kit is the self-service counterpart to trustee escrow:
//! the master key is split with a fixed k-of-n template (default 3/5)
//! and each share is wrapped under an Argon2id key derived from a kit
//! passphrase, with a unique salt per share.  The resulting JSON bundle
//! is portable — print it, engrave it, scatter the shares across safe
//! deposit boxes.  Restoring needs the kit passphrase plus any two or
//! more shares, and is verified against a commitment before the key is
//! trusted.
//!
//! The bundle embeds the vault's KDF salt and the Argon2 parameters, so
//! a restore is possible with nothing but this file and the passphrases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::kdf::{derive_master_key_with_params, generate_salt, Argon2Params};
use crate::crypto::keys::MasterKey;
use crate::errors::{HeirVaultError, Result};
use crate::sharing::{self, SecretCommitment, SecretShare};
use crate::vault::format::{base64_decode, base64_encode, StoredArgon2Params};

/// Current bundle format version.
pub const KIT_VERSION: u32 = 1;

/// Minimum number of shares a restore will accept.
pub const MIN_RESTORE_SHARES: usize = 2;

/// The k-of-n template for a kit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KitConfig {
    pub threshold: u8,
    pub total: u8,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            total: 5,
        }
    }
}

/// One passphrase-wrapped share of the master key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitShare {
    /// The share's x-coordinate.
    pub index: u8,

    /// Unique KDF salt for this share's wrap key.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// The share bytes (`index || data`), AES-256-GCM encrypted under
    /// the passphrase-derived wrap key.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub encrypted_share: Vec<u8>,
}

/// A portable recovery bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryKitBundle {
    pub user_id: String,
    pub email: String,

    pub vault_master_key_shares: Vec<KitShare>,

    /// The vault's master-key derivation salt (non-secret).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// Commitment to the master key, checked on restore.
    pub commitment: SecretCommitment,

    /// Argon2 parameters for the per-share wrap keys.
    pub argon2_params: StoredArgon2Params,

    pub created_at: DateTime<Utc>,
    pub version: u32,
    pub instructions: String,
}

impl RecoveryKitBundle {
    /// Serialize the bundle as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| HeirVaultError::SerializationError(format!("recovery kit: {e}")))
    }

    /// Parse a bundle from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| HeirVaultError::SerializationError(format!("recovery kit: {e}")))
    }
}

/// Generate a recovery kit for the current master key.
pub fn generate(
    user_id: &str,
    email: &str,
    master_key: &MasterKey,
    vault_salt: &[u8],
    kit_passphrase: &str,
    config: KitConfig,
    argon2_params: &Argon2Params,
) -> Result<RecoveryKitBundle> {
    let secret = master_key.as_bytes();
    let shares = sharing::split(secret, config.threshold, config.total)?;
    let commitment = SecretCommitment::compute(secret);

    let mut kit_shares = Vec::with_capacity(shares.len());
    for share in &shares {
        // Unique salt per share: no two shares wrap under the same key.
        let salt = generate_salt();
        let wrap_key = Zeroizing::new(derive_master_key_with_params(
            kit_passphrase.as_bytes(),
            &salt,
            argon2_params,
        )?);

        let encrypted_share = encrypt(wrap_key.as_ref(), &share.to_bytes())?;

        kit_shares.push(KitShare {
            index: share.index,
            salt: salt.to_vec(),
            encrypted_share,
        });
    }

    Ok(RecoveryKitBundle {
        user_id: user_id.to_string(),
        email: email.to_string(),
        vault_master_key_shares: kit_shares,
        salt: vault_salt.to_vec(),
        commitment,
        argon2_params: StoredArgon2Params {
            memory_kib: argon2_params.memory_kib,
            iterations: argon2_params.iterations,
            parallelism: argon2_params.parallelism,
        },
        created_at: Utc::now(),
        version: KIT_VERSION,
        instructions: instructions_text(config),
    })
}

/// Restore the master key from a bundle.
///
/// `share_indices` selects which of the bundle's shares to use; at
/// least two are required.  Returns the reconstructed master key and
/// the vault's derivation salt.
pub fn restore(
    bundle: &RecoveryKitBundle,
    share_indices: &[u8],
    kit_passphrase: &str,
) -> Result<(MasterKey, Vec<u8>)> {
    if share_indices.len() < MIN_RESTORE_SHARES {
        return Err(HeirVaultError::InsufficientShares {
            required: MIN_RESTORE_SHARES,
            provided: share_indices.len(),
        });
    }

    let params = Argon2Params {
        memory_kib: bundle.argon2_params.memory_kib,
        iterations: bundle.argon2_params.iterations,
        parallelism: bundle.argon2_params.parallelism,
    };

    let mut shares = Vec::with_capacity(share_indices.len());
    for &index in share_indices {
        let kit_share = bundle
            .vault_master_key_shares
            .iter()
            .find(|s| s.index == index)
            .ok_or_else(|| {
                HeirVaultError::InvalidInput(format!("the kit has no share with index {index}"))
            })?;

        let wrap_key = Zeroizing::new(derive_master_key_with_params(
            kit_passphrase.as_bytes(),
            &kit_share.salt,
            &params,
        )?);

        // A wrong kit passphrase fails here, on the first share's
        // authentication tag.
        let share_bytes = Zeroizing::new(decrypt(wrap_key.as_ref(), &kit_share.encrypted_share)?);
        shares.push(SecretShare::from_bytes(&share_bytes)?);
    }

    let recombined = Zeroizing::new(sharing::combine(&shares)?);

    // Under-threshold or mismatched shares interpolate to garbage;
    // the commitment is what catches that.
    bundle.commitment.verify(&recombined)?;

    let key_bytes: [u8; 32] = recombined.as_slice().try_into().map_err(|_| {
        HeirVaultError::InvalidInput(format!(
            "recombined key is {} bytes, expected 32",
            recombined.len()
        ))
    })?;

    Ok((MasterKey::new(key_bytes), bundle.salt.clone()))
}

fn instructions_text(config: KitConfig) -> String {
    format!(
        "HEIRVAULT RECOVERY KIT\n\
         \n\
         This kit contains {total} encrypted shares of your vault master key.\n\
         Any {threshold} shares, together with your kit passphrase, can\n\
         rebuild the key. Fewer than {threshold} reveal nothing.\n\
         \n\
         1. Store each share in a separate location (print, engrave, or\n\
            save to separate drives). Do not keep the whole kit in one place.\n\
         2. Keep your kit passphrase separate from the shares.\n\
         3. To recover, run: heirvault kit restore <kit-file>\n\
            and supply at least two share indices when prompted.",
        total = config.total,
        threshold = config.threshold,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn test_master() -> MasterKey {
        MasterKey::new([0x6Bu8; 32])
    }

    #[test]
    fn generate_restore_roundtrip() {
        let master = test_master();
        let bundle = generate(
            "owner-1",
            "owner@example.com",
            &master,
            &[0xAA; 32],
            "kit passphrase",
            KitConfig::default(),
            &fast_params(),
        )
        .unwrap();

        assert_eq!(bundle.vault_master_key_shares.len(), 5);
        assert_eq!(bundle.version, KIT_VERSION);

        let (restored, salt) = restore(&bundle, &[1, 3, 5], "kit passphrase").unwrap();
        assert_eq!(restored.as_bytes(), master.as_bytes());
        assert_eq!(salt, vec![0xAA; 32]);
    }

    #[test]
    fn restore_rejects_single_share() {
        let master = test_master();
        let bundle = generate(
            "owner-1",
            "owner@example.com",
            &master,
            &[0xAA; 32],
            "pw",
            KitConfig::default(),
            &fast_params(),
        )
        .unwrap();

        let result = restore(&bundle, &[1], "pw");
        assert!(matches!(
            result,
            Err(HeirVaultError::InsufficientShares { .. })
        ));
    }

    #[test]
    fn restore_with_wrong_passphrase_fails() {
        let master = test_master();
        let bundle = generate(
            "owner-1",
            "owner@example.com",
            &master,
            &[0xAA; 32],
            "right",
            KitConfig::default(),
            &fast_params(),
        )
        .unwrap();

        assert!(restore(&bundle, &[1, 2, 3], "wrong").is_err());
    }

    #[test]
    fn under_threshold_restore_is_caught_by_commitment() {
        let master = test_master();
        let bundle = generate(
            "owner-1",
            "owner@example.com",
            &master,
            &[0xAA; 32],
            "pw",
            KitConfig::default(),
            &fast_params(),
        )
        .unwrap();

        // Two shares of a 3-of-5 kit interpolate to the wrong bytes;
        // the commitment check must refuse them.
        let result = restore(&bundle, &[1, 2], "pw");
        assert!(matches!(result, Err(HeirVaultError::CommitmentMismatch)));
    }

    #[test]
    fn bundle_json_roundtrip() {
        let master = test_master();
        let bundle = generate(
            "owner-1",
            "owner@example.com",
            &master,
            &[0xAA; 32],
            "pw",
            KitConfig { threshold: 2, total: 3 },
            &fast_params(),
        )
        .unwrap();

        let json = bundle.to_json().unwrap();
        let parsed = RecoveryKitBundle::from_json(&json).unwrap();

        let (restored, _) = restore(&parsed, &[2, 3], "pw").unwrap();
        assert_eq!(restored.as_bytes(), master.as_bytes());
    }
}
