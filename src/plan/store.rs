//! Plan persistence.
//!
//! `PlanStore` is the contract this core needs from whatever holds the
//! plans — a remote inheritance API in a hosted deployment, or the
//! bundled `JsonPlanStore` for local-first use.  Every mutation is a
//! whole-plan read-modify-write: two processes approving the same plan
//! concurrently is a lost-update race that the persistence layer owns.
//! The stored plan is therefore the only authoritative source of the
//! approval count — never re-sum a possibly-stale local copy.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::errors::{HeirVaultError, Result};
use crate::trustee::EncryptedShare;

use super::types::{InheritancePlan, PlanStatusReport};

/// The persistence contract for inheritance plans.
pub trait PlanStore {
    /// Persist a freshly created plan.
    fn create_plan(&self, plan: &InheritancePlan) -> Result<()>;

    /// All plans, sorted by creation time (newest first).
    fn list_plans(&self) -> Result<Vec<InheritancePlan>>;

    /// Fetch one plan.
    fn get_plan(&self, plan_id: &str) -> Result<InheritancePlan>;

    /// Fetch one plan with its derived approval progress.
    fn get_plan_status(&self, plan_id: &str, now: DateTime<Utc>) -> Result<PlanStatusReport>;

    /// Record a trustee's approval.  Deduplicated here as well as in
    /// the state machine; returns `false` when it was already recorded.
    fn approve_plan(&self, plan_id: &str, trustee_id: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Trigger the plan.  `reason` is mandatory for the audit trail;
    /// `emergency_override` is recorded by the caller's audit log and
    /// does not bypass the quorum or waiting-period checks.
    fn trigger_inheritance(&self, plan_id: &str, reason: &str, now: DateTime<Utc>) -> Result<()>;

    /// Mark the plan completed after a successful reconstruction.
    fn complete_plan(&self, plan_id: &str, now: DateTime<Utc>) -> Result<()>;

    /// Cancel the plan (owner-only, from active).
    fn cancel_plan(&self, plan_id: &str) -> Result<()>;

    /// The encrypted shares, for beneficiary-side collection.  Only
    /// available once the plan has triggered.
    fn get_trustee_shares(&self, plan_id: &str) -> Result<Vec<EncryptedShare>>;

    /// Replace a plan after an owner edit (permitted only while the
    /// stored copy is still active).
    fn update_plan(&self, plan: &InheritancePlan) -> Result<()>;

    /// Delete the plan (permitted from active or cancelled).
    fn delete_plan(&self, plan_id: &str) -> Result<()>;
}

/// Local-first `PlanStore`: one JSON file per plan.
///
/// Writes go through temp-file + rename so readers never see a
/// half-written plan.
pub struct JsonPlanStore {
    dir: PathBuf,
}

impl JsonPlanStore {
    /// Create a store rooted at `<vault_dir>/plans`.
    pub fn open(vault_dir: &Path) -> Result<Self> {
        let dir = vault_dir.join("plans");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn plan_path(&self, plan_id: &str) -> PathBuf {
        self.dir.join(format!("{plan_id}.json"))
    }

    fn read_plan(&self, plan_id: &str) -> Result<InheritancePlan> {
        let path = self.plan_path(plan_id);
        if !path.exists() {
            return Err(HeirVaultError::PlanNotFound(plan_id.to_string()));
        }

        let bytes = fs::read(&path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| HeirVaultError::SerializationError(format!("plan {plan_id}: {e}")))
    }

    fn write_plan(&self, plan: &InheritancePlan) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(plan)
            .map_err(|e| HeirVaultError::SerializationError(format!("plan {}: {e}", plan.id)))?;

        let path = self.plan_path(&plan.id);
        let tmp_path = self.dir.join(format!(".{}.json.tmp", plan.id));
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl PlanStore for JsonPlanStore {
    fn create_plan(&self, plan: &InheritancePlan) -> Result<()> {
        let path = self.plan_path(&plan.id);
        if path.exists() {
            return Err(HeirVaultError::CommandFailed(format!(
                "plan {} already exists",
                plan.id
            )));
        }
        self.write_plan(plan)
    }

    fn list_plans(&self) -> Result<Vec<InheritancePlan>> {
        let mut plans = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            let plan: InheritancePlan = serde_json::from_slice(&bytes).map_err(|e| {
                HeirVaultError::SerializationError(format!("{}: {e}", path.display()))
            })?;
            plans.push(plan);
        }

        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    fn get_plan(&self, plan_id: &str) -> Result<InheritancePlan> {
        self.read_plan(plan_id)
    }

    fn get_plan_status(&self, plan_id: &str, now: DateTime<Utc>) -> Result<PlanStatusReport> {
        let plan = self.read_plan(plan_id)?;
        let progress = plan.approval_progress(now);
        Ok(PlanStatusReport { plan, progress })
    }

    fn approve_plan(&self, plan_id: &str, trustee_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut plan = self.read_plan(plan_id)?;

        // The state machine is idempotent, but check the stored record
        // too so a no-op approval never rewrites the file.
        if plan
            .trustees
            .iter()
            .any(|t| t.id == trustee_id && t.has_approved)
        {
            return Ok(false);
        }

        let recorded = plan.approve(trustee_id, now)?;
        if recorded {
            self.write_plan(&plan)?;
        }
        Ok(recorded)
    }

    fn trigger_inheritance(&self, plan_id: &str, reason: &str, now: DateTime<Utc>) -> Result<()> {
        let mut plan = self.read_plan(plan_id)?;
        plan.trigger(reason, now)?;
        self.write_plan(&plan)
    }

    fn complete_plan(&self, plan_id: &str, now: DateTime<Utc>) -> Result<()> {
        let mut plan = self.read_plan(plan_id)?;
        plan.complete(now)?;
        self.write_plan(&plan)
    }

    fn cancel_plan(&self, plan_id: &str) -> Result<()> {
        let mut plan = self.read_plan(plan_id)?;
        plan.cancel()?;
        self.write_plan(&plan)
    }

    fn get_trustee_shares(&self, plan_id: &str) -> Result<Vec<EncryptedShare>> {
        let plan = self.read_plan(plan_id)?;

        if plan.status != super::types::PlanStatus::Triggered {
            return Err(HeirVaultError::InvalidTransition {
                action: "collect shares for",
                status: plan.status.to_string(),
            });
        }

        Ok(plan
            .trustees
            .iter()
            .map(|t| t.encrypted_share.clone())
            .collect())
    }

    fn update_plan(&self, plan: &InheritancePlan) -> Result<()> {
        // Edits are gated on the *stored* status, not the caller's
        // possibly-stale copy.
        let stored = self.read_plan(&plan.id)?;
        if !stored.can_edit() {
            return Err(HeirVaultError::InvalidTransition {
                action: "edit",
                status: stored.status.to_string(),
            });
        }
        self.write_plan(plan)
    }

    fn delete_plan(&self, plan_id: &str) -> Result<()> {
        let plan = self.read_plan(plan_id)?;
        if !plan.can_delete() {
            return Err(HeirVaultError::InvalidTransition {
                action: "delete",
                status: plan.status.to_string(),
            });
        }
        fs::remove_file(self.plan_path(plan_id))?;
        Ok(())
    }
}
