//! Inheritance plans — split-key escrow gated by trustee approvals and
//! a waiting period.
//!
//! This module provides:
//! - Plan, trustee, and beneficiary types (`types`)
//! - The lifecycle state machine (`lifecycle`)
//! - The persistence contract and local JSON store (`store`)

pub mod lifecycle;
pub mod store;
pub mod types;

pub use store::{JsonPlanStore, PlanStore};
pub use types::{
    ApprovalProgress, Beneficiary, InheritancePlan, PlanStatus, PlanStatusReport, Trustee,
};

use x25519_dalek::PublicKey;

use crate::crypto::keys::MasterKey;
use crate::errors::Result;
use crate::sharing::{self, SecretCommitment};
use crate::trustee::envelope;

/// A trustee-to-be: contact details plus the public key their share
/// will be wrapped for.
pub struct TrusteeInput {
    pub email: String,
    pub name: String,
    pub public_key: PublicKey,
}

/// Split the master key k-of-n and wrap one share per trustee.
///
/// Returns the trustee records (share index `i + 1` goes to trustee
/// `i`) and the commitment a beneficiary will later verify the
/// reconstruction against.  Used at plan creation and again on every
/// edit, since any change to trustees or threshold invalidates the old
/// share set.
pub fn distribute_shares(
    master_key: &MasterKey,
    k_threshold: u8,
    plan_id: &str,
    inputs: &[TrusteeInput],
) -> Result<(Vec<Trustee>, SecretCommitment)> {
    if inputs.len() > usize::from(sharing::MAX_SHARES) {
        return Err(crate::errors::HeirVaultError::TooManyShares {
            maximum: sharing::MAX_SHARES,
            requested: u8::try_from(inputs.len()).unwrap_or(u8::MAX),
        });
    }

    let secret = master_key.as_bytes();
    let shares = sharing::split(secret, k_threshold, inputs.len() as u8)?;
    let commitment = SecretCommitment::compute(secret);

    let mut trustees = Vec::with_capacity(inputs.len());
    for (input, share) in inputs.iter().zip(&shares) {
        let encrypted = envelope::encrypt_share(
            &share.to_bytes(),
            share.index,
            &input.email,
            &input.public_key,
        )?;
        trustees.push(Trustee::new(
            plan_id,
            &input.email,
            &input.name,
            share.index,
            &crate::trustee::keys::export_public_key_pem(&input.public_key),
            encrypted,
        ));
    }

    Ok((trustees, commitment))
}
