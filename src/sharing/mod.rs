//! Shamir secret sharing for the Vault Master Key.
//!
//! Splits an arbitrary byte secret into `n` shares with reconstruction
//! threshold `k`, byte-wise over GF(256): each byte of the secret is
//! the constant term of a random polynomial of degree `k - 1`,
//! evaluated at the non-zero x-coordinates `1..=n`.  Any `k` shares
//! reconstruct the exact original bytes by Lagrange interpolation;
//! fewer than `k` reveal nothing.
//!
//! # Security Model
//!
//! Interpolation has no built-in share-authenticity check: combining
//! two-or-more shares that are wrong, corrupted, or below threshold
//! still produces *some* plausible byte string.  Callers must verify
//! the result against a [`SecretCommitment`] stored alongside the
//! shares before trusting it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sharks::{Share, Sharks};
use subtle::ConstantTimeEq;

use crate::errors::{HeirVaultError, Result};
use crate::vault::format::{base64_decode, base64_encode};

/// Practical ceiling on the number of shares (trustee-count cap, not a
/// mathematical limit — GF(256) supports up to 255).
pub const MAX_SHARES: u8 = 10;

/// Minimum reconstruction threshold.
pub const MIN_THRESHOLD: u8 = 2;

/// Minimum number of shares `combine` will accept.
pub const MIN_COMBINE_SHARES: usize = 2;

/// One Shamir share: the x-coordinate and the per-byte y-values.
///
/// `index` must be unique within a plan; it is never zero (x = 0 holds
/// the secret itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretShare {
    pub index: u8,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub data: Vec<u8>,
}

impl SecretShare {
    /// Serialize as raw bytes: `index || data`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.data.len());
        bytes.push(self.index);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Parse a share from `index || data` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(HeirVaultError::InvalidInput(
                "share must be at least 2 bytes (index + data)".into(),
            ));
        }
        if bytes[0] == 0 {
            return Err(HeirVaultError::InvalidInput(
                "share index cannot be 0".into(),
            ));
        }
        Ok(Self {
            index: bytes[0],
            data: bytes[1..].to_vec(),
        })
    }

    fn to_sharks_share(&self) -> Result<Share> {
        Share::try_from(self.to_bytes().as_slice())
            .map_err(|e| HeirVaultError::InvalidInput(format!("malformed share: {e}")))
    }

    fn from_sharks_share(share: &Share) -> Self {
        let bytes: Vec<u8> = Vec::from(share);
        Self {
            index: bytes[0],
            data: bytes[1..].to_vec(),
        }
    }
}

/// Split `secret` into `total` shares, any `threshold` of which
/// reconstruct it.
pub fn split(secret: &[u8], threshold: u8, total: u8) -> Result<Vec<SecretShare>> {
    if secret.is_empty() {
        return Err(HeirVaultError::InvalidInput("secret cannot be empty".into()));
    }
    if threshold < MIN_THRESHOLD {
        return Err(HeirVaultError::InvalidThreshold(threshold));
    }
    if total < threshold {
        return Err(HeirVaultError::InvalidConfig { threshold, total });
    }
    if total > MAX_SHARES {
        return Err(HeirVaultError::TooManyShares {
            maximum: MAX_SHARES,
            requested: total,
        });
    }

    let sharks = Sharks(threshold);
    let dealer = sharks.dealer(secret);

    // The dealer evaluates at x = 1, 2, 3, ... so indices come out
    // distinct and non-zero.
    let shares: Vec<SecretShare> = dealer
        .take(total as usize)
        .map(|s| SecretShare::from_sharks_share(&s))
        .collect();

    debug_assert_eq!(shares.len(), total as usize);
    Ok(shares)
}

/// Combine shares by Lagrange interpolation at x = 0.
///
/// Requires at least two shares with distinct indices.  Note that this
/// does NOT detect under-threshold or mismatched share sets: any set of
/// well-formed shares interpolates to *some* byte string.  Verify the
/// result with [`SecretCommitment::verify`] before using it.
pub fn combine(shares: &[SecretShare]) -> Result<Vec<u8>> {
    if shares.len() < MIN_COMBINE_SHARES {
        return Err(HeirVaultError::InsufficientShares {
            required: MIN_COMBINE_SHARES,
            provided: shares.len(),
        });
    }
    if shares.len() > MAX_SHARES as usize {
        return Err(HeirVaultError::TooManyShares {
            maximum: MAX_SHARES,
            requested: shares.len() as u8,
        });
    }

    let mut seen = HashSet::new();
    for share in shares {
        if !seen.insert(share.index) {
            return Err(HeirVaultError::DuplicateShareIndex(share.index));
        }
    }

    let sharks_shares: Vec<Share> = shares
        .iter()
        .map(SecretShare::to_sharks_share)
        .collect::<Result<_>>()?;

    // Recover with the provided share count as the threshold so every
    // supplied point participates in the interpolation.
    let sharks = Sharks(shares.len() as u8);
    sharks
        .recover(&sharks_shares)
        .map_err(|e| HeirVaultError::InvalidInput(format!("share recombination failed: {e}")))
}

/// A SHA-256 commitment to a split secret.
///
/// Stored (non-secret) alongside the shares so a reconstructing party
/// can detect wrong, corrupted, or under-threshold combinations before
/// using the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretCommitment(
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")] Vec<u8>,
);

impl SecretCommitment {
    /// Compute the commitment for a secret.
    pub fn compute(secret: &[u8]) -> Self {
        Self(Sha256::digest(secret).to_vec())
    }

    /// Check a candidate reconstruction against this commitment.
    ///
    /// Uses constant-time comparison to avoid timing side channels.
    pub fn verify(&self, candidate: &[u8]) -> Result<()> {
        let actual = Sha256::digest(candidate);
        if self.0.ct_eq(actual.as_slice()).into() {
            Ok(())
        } else {
            Err(HeirVaultError::CommitmentMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_bytes_roundtrip() {
        let share = SecretShare {
            index: 3,
            data: vec![0xDE, 0xAD, 0xBE, 0xEF],
        };
        let parsed = SecretShare::from_bytes(&share.to_bytes()).unwrap();
        assert_eq!(parsed, share);
    }

    #[test]
    fn zero_index_rejected() {
        assert!(SecretShare::from_bytes(&[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn commitment_detects_mismatch() {
        let commitment = SecretCommitment::compute(b"the real secret");
        assert!(commitment.verify(b"the real secret").is_ok());
        assert!(commitment.verify(b"an impostor").is_err());
    }
}
