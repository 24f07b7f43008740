//! Plan lifecycle state machine.
//!
//! Every transition validates its preconditions before touching any
//! field, so a rejected operation always leaves the plan exactly as it
//! was.  `can_trigger` is derived on demand and never stored.
//!
//! All time-dependent checks take `now` as a parameter; callers pass
//! `Utc::now()` and tests pass synthetic instants.

use chrono::{DateTime, Duration, Utc};

use crate::errors::{HeirVaultError, Result};
use crate::sharing::{self, SecretCommitment};

use super::types::{ApprovalProgress, Beneficiary, InheritancePlan, PlanStatus, Trustee};

impl InheritancePlan {
    /// Assemble and validate a new plan (status = active).
    ///
    /// The caller has already split the master key and wrapped one
    /// share per trustee (which is why `id` comes from outside: the
    /// trustee records reference it); this constructor checks the k/n
    /// bounds and the share-index bookkeeping.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: &str,
        owner_id: &str,
        name: &str,
        k_threshold: u8,
        waiting_period_days: u32,
        trustees: Vec<Trustee>,
        beneficiaries: Vec<Beneficiary>,
        item_ids: Vec<String>,
        share_commitment: SecretCommitment,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(HeirVaultError::InvalidInput(
                "plan name cannot be empty".into(),
            ));
        }

        let n_total = u8::try_from(trustees.len()).map_err(|_| HeirVaultError::TooManyShares {
            maximum: sharing::MAX_SHARES,
            requested: u8::MAX,
        })?;

        validate_share_config(k_threshold, n_total)?;
        validate_share_indices(&trustees, n_total)?;

        Ok(Self {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            k_threshold,
            n_total,
            waiting_period_days,
            status: PlanStatus::Active,
            trustees,
            beneficiaries,
            item_ids,
            share_commitment,
            created_at: now,
            triggered_at: None,
            trigger_reason: None,
            completed_at: None,
        })
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// Number of trustees that have approved.
    ///
    /// Authoritative only for the stored copy of the plan: a locally
    /// cached plan may be stale relative to approvals recorded by the
    /// persistence layer.
    pub fn approved_count(&self) -> usize {
        self.trustees.iter().filter(|t| t.has_approved).count()
    }

    /// Earliest instant at which a trigger can take effect.
    pub fn trigger_available_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::days(i64::from(self.waiting_period_days))
    }

    /// Whether a trigger at `now` would be accepted.
    pub fn can_trigger(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, PlanStatus::Active | PlanStatus::Ready)
            && self.approved_count() >= usize::from(self.k_threshold)
            && now >= self.trigger_available_at()
    }

    /// Derived approval summary.
    pub fn approval_progress(&self, now: DateTime<Utc>) -> ApprovalProgress {
        ApprovalProgress {
            approved: self.approved_count(),
            total: self.trustees.len(),
            required: usize::from(self.k_threshold),
            can_trigger: self.can_trigger(now),
        }
    }

    /// Whether owner edits are currently permitted.
    pub fn can_edit(&self) -> bool {
        self.status == PlanStatus::Active
    }

    /// Whether the plan may be deleted.
    pub fn can_delete(&self) -> bool {
        matches!(self.status, PlanStatus::Active | PlanStatus::Cancelled)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Record one trustee's approval.
    ///
    /// Idempotent: approving an already-approved trustee changes
    /// nothing and returns `Ok(false)`.  Returns `Ok(true)` when the
    /// approval was newly recorded.
    pub fn approve(&mut self, trustee_id: &str, now: DateTime<Utc>) -> Result<bool> {
        if !matches!(self.status, PlanStatus::Active | PlanStatus::Ready) {
            return Err(HeirVaultError::InvalidTransition {
                action: "approve",
                status: self.status.to_string(),
            });
        }

        let trustee = self
            .trustees
            .iter_mut()
            .find(|t| t.id == trustee_id)
            .ok_or_else(|| HeirVaultError::TrusteeNotFound(trustee_id.to_string()))?;

        if trustee.has_approved {
            return Ok(false);
        }

        trustee.has_approved = true;
        trustee.approved_at = Some(now);
        Ok(true)
    }

    /// Trigger the plan, opening share collection to beneficiaries.
    ///
    /// Rejected (without any state change) unless the quorum is met,
    /// the waiting period has elapsed, the status permits it, and a
    /// non-empty reason is given for the audit trail.
    pub fn trigger(&mut self, reason: &str, now: DateTime<Utc>) -> Result<()> {
        if reason.trim().is_empty() {
            return Err(HeirVaultError::InvalidInput(
                "a trigger reason is required".into(),
            ));
        }

        if !matches!(self.status, PlanStatus::Active | PlanStatus::Ready) {
            return Err(HeirVaultError::InvalidTransition {
                action: "trigger",
                status: self.status.to_string(),
            });
        }

        let approved = self.approved_count();
        let required = usize::from(self.k_threshold);
        if approved < required {
            return Err(HeirVaultError::QuorumNotMet { approved, required });
        }

        let available_at = self.trigger_available_at();
        if now < available_at {
            return Err(HeirVaultError::WaitingPeriodNotElapsed { available_at });
        }

        self.status = PlanStatus::Triggered;
        self.triggered_at = Some(now);
        self.trigger_reason = Some(reason.to_string());
        Ok(())
    }

    /// Mark the plan completed after a beneficiary has reconstructed
    /// access.  Only valid from `triggered`.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != PlanStatus::Triggered {
            return Err(HeirVaultError::InvalidTransition {
                action: "complete",
                status: self.status.to_string(),
            });
        }

        self.status = PlanStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Cancel the plan.  Owner-only, and only from `active`.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status != PlanStatus::Active {
            return Err(HeirVaultError::InvalidTransition {
                action: "cancel",
                status: self.status.to_string(),
            });
        }

        self.status = PlanStatus::Cancelled;
        Ok(())
    }

    /// Replace the share set after an edit re-split.
    ///
    /// Editing trustees or the threshold invalidates every existing
    /// share, so the caller re-splits the master key and hands the new
    /// trustee records (with fresh encrypted shares) here.  All
    /// approvals reset: the quorum must be re-earned against the new
    /// configuration.
    pub fn replace_shares(
        &mut self,
        k_threshold: u8,
        trustees: Vec<Trustee>,
        share_commitment: SecretCommitment,
    ) -> Result<()> {
        if !self.can_edit() {
            return Err(HeirVaultError::InvalidTransition {
                action: "edit",
                status: self.status.to_string(),
            });
        }

        let n_total = u8::try_from(trustees.len()).map_err(|_| HeirVaultError::TooManyShares {
            maximum: sharing::MAX_SHARES,
            requested: u8::MAX,
        })?;
        validate_share_config(k_threshold, n_total)?;
        validate_share_indices(&trustees, n_total)?;

        self.k_threshold = k_threshold;
        self.n_total = n_total;
        self.trustees = trustees;
        self.share_commitment = share_commitment;
        Ok(())
    }
}

/// Check the `2 ≤ k ≤ n ≤ 10` bounds.
fn validate_share_config(k_threshold: u8, n_total: u8) -> Result<()> {
    if k_threshold < sharing::MIN_THRESHOLD {
        return Err(HeirVaultError::InvalidThreshold(k_threshold));
    }
    if n_total < k_threshold {
        return Err(HeirVaultError::InvalidConfig {
            threshold: k_threshold,
            total: n_total,
        });
    }
    if n_total > sharing::MAX_SHARES {
        return Err(HeirVaultError::TooManyShares {
            maximum: sharing::MAX_SHARES,
            requested: n_total,
        });
    }
    Ok(())
}

/// Check that trustee share indices are exactly `1..=n`, one each.
fn validate_share_indices(trustees: &[Trustee], n_total: u8) -> Result<()> {
    let mut seen = vec![false; usize::from(n_total) + 1];
    for trustee in trustees {
        let index = trustee.share_index;
        if index == 0 || index > n_total {
            return Err(HeirVaultError::InvalidInput(format!(
                "share index {index} is outside 1..={n_total}"
            )));
        }
        if seen[usize::from(index)] {
            return Err(HeirVaultError::DuplicateShareIndex(index));
        }
        seen[usize::from(index)] = true;
    }
    Ok(())
}
