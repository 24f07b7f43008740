//! Inheritance plan data types.
//!
//! A plan binds together the split master key (one encrypted share per
//! trustee), the approval bookkeeping, and the beneficiaries who gain
//! access once the plan triggers.  Plans reference vault items by id
//! only — no plaintext, and no content-key material, ever lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sharing::SecretCommitment;
use crate::trustee::EncryptedShare;

/// Lifecycle status of a plan.
///
/// Valid transitions: `active → {ready|triggered} → completed`, plus
/// the side branch `active → cancelled`.  `ready` is accepted when read
/// back from a store but is never produced by this implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Ready,
    Triggered,
    Completed,
    Cancelled,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanStatus::Active => "active",
            PlanStatus::Ready => "ready",
            PlanStatus::Triggered => "triggered",
            PlanStatus::Completed => "completed",
            PlanStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One trustee: holder of one encrypted share and one approval vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trustee {
    pub id: String,
    pub plan_id: String,
    pub email: String,
    pub name: String,

    /// The x-coordinate of this trustee's share (unique within the plan).
    pub share_index: u8,

    /// PEM armor of the trustee's public key.  Kept so an owner edit
    /// can re-split and re-wrap without collecting keys again.
    pub public_key_pem: String,

    /// This trustee's Shamir share, wrapped for their public key.
    pub encrypted_share: EncryptedShare,

    pub has_approved: bool,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Trustee {
    /// Build a trustee record for a new plan.
    pub fn new(
        plan_id: &str,
        email: &str,
        name: &str,
        share_index: u8,
        public_key_pem: &str,
        encrypted_share: EncryptedShare,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            plan_id: plan_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            share_index,
            public_key_pem: public_key_pem.to_string(),
            encrypted_share,
            has_approved: false,
            approved_at: None,
        }
    }
}

/// A beneficiary: receives reconstructed access after the plan
/// triggers.  Holds no cryptographic material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: String,
    pub plan_id: String,
    pub email: String,
    pub name: String,
    pub relationship: String,
}

impl Beneficiary {
    pub fn new(plan_id: &str, email: &str, name: &str, relationship: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            plan_id: plan_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            relationship: relationship.to_string(),
        }
    }
}

/// An inheritance plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritancePlan {
    pub id: String,
    pub owner_id: String,
    pub name: String,

    /// Minimum approvals (and shares) required to release access.
    pub k_threshold: u8,

    /// Total number of trustees/shares.
    pub n_total: u8,

    /// Mandatory delay between creation and the earliest valid trigger.
    pub waiting_period_days: u32,

    pub status: PlanStatus,

    pub trustees: Vec<Trustee>,
    pub beneficiaries: Vec<Beneficiary>,

    /// Ids of the vault items this plan releases (ids only — the plan
    /// never stores plaintext or key material).
    pub item_ids: Vec<String>,

    /// Commitment to the split master key, so a beneficiary can verify
    /// a reconstruction before trusting it.
    pub share_commitment: SecretCommitment,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Derived approval/trigger summary for status displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalProgress {
    pub approved: usize,
    pub total: usize,
    pub required: usize,
    pub can_trigger: bool,
}

/// A plan together with its derived approval progress.
#[derive(Debug, Clone)]
pub struct PlanStatusReport {
    pub plan: InheritancePlan,
    pub progress: ApprovalProgress,
}
