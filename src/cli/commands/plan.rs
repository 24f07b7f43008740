//! `heirvault plan` — inheritance plan management.
//!
//! Creation splits the vault master key k-of-n and wraps one share per
//! trustee; from then on the plan file carries only wrapped shares and
//! approval bookkeeping.  Trigger is gated by the approval quorum and
//! the waiting period; reconstruction happens on the beneficiary side
//! from trustee-decrypted shares.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{
    parse_beneficiary_spec, parse_trustee_spec, prompt_passphrase_for_vault, vault_dir,
    vault_path, Cli,
};
use crate::config::Settings;
use crate::errors::{HeirVaultError, Result};
use crate::plan::{
    distribute_shares, Beneficiary, InheritancePlan, JsonPlanStore, PlanStore, TrusteeInput,
};
use crate::sharing::{self, SecretShare};
use crate::trustee::keys::import_public_key;
use crate::vault::VaultStore;

/// Open the plan store under the CLI's vault directory.
fn plan_store(cli: &Cli) -> Result<JsonPlanStore> {
    JsonPlanStore::open(&vault_dir(cli)?)
}

/// Load and parse trustee specs into inputs for share distribution.
fn load_trustee_inputs(specs: &[String]) -> Result<Vec<TrusteeInput>> {
    let mut inputs = Vec::with_capacity(specs.len());
    for spec in specs {
        let parsed = parse_trustee_spec(spec)?;
        let pem = fs::read_to_string(&parsed.pubkey_path).map_err(|e| {
            HeirVaultError::KeyImport(format!("cannot read {}: {e}", parsed.pubkey_path))
        })?;
        inputs.push(TrusteeInput {
            email: parsed.email,
            name: parsed.name,
            public_key: import_public_key(&pem)?,
        });
    }
    Ok(inputs)
}

/// Execute `plan create`.
pub fn execute_create(
    cli: &Cli,
    name: &str,
    threshold: Option<u8>,
    waiting_days: Option<u32>,
    trustee_specs: &[String],
    beneficiary_specs: &[String],
    item_names: &[String],
) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;

    let k_threshold = threshold.unwrap_or(settings.default_threshold);
    let waiting_period_days = waiting_days.unwrap_or(settings.default_waiting_period_days);

    // 1. Open the vault: we need the master key to split, and the item
    //    ids to reference.
    let path = vault_path(cli)?;
    let vault_id = path.to_string_lossy();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    let store = VaultStore::open(&path, passphrase.as_bytes())?;

    let mut item_ids = Vec::with_capacity(item_names.len());
    for item_name in item_names {
        item_ids.push(store.item_id(item_name)?);
    }

    // 2. Parse trustee/beneficiary specs and load trustee public keys.
    let inputs = load_trustee_inputs(trustee_specs)?;

    let plan_id = uuid::Uuid::new_v4().to_string();

    let beneficiaries: Vec<Beneficiary> = beneficiary_specs
        .iter()
        .map(|spec| {
            let parsed = parse_beneficiary_spec(spec)?;
            Ok(Beneficiary::new(
                &plan_id,
                &parsed.email,
                &parsed.name,
                &parsed.relationship,
            ))
        })
        .collect::<Result<_>>()?;

    // 3. Split the master key and wrap one share per trustee.
    let (trustees, commitment) =
        distribute_shares(store.master_key(), k_threshold, &plan_id, &inputs)?;

    // 4. Assemble, validate, and persist the plan.
    let plan = InheritancePlan::create(
        &plan_id,
        store.owner_id(),
        name,
        k_threshold,
        waiting_period_days,
        trustees,
        beneficiaries,
        item_ids,
        commitment,
        Utc::now(),
    )?;

    plan_store(cli)?.create_plan(&plan)?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &vault_dir(cli)?,
        "plan-create",
        Some(&plan.id),
        None,
        Some(&format!(
            "{}-of-{} trustees, {} day wait",
            plan.k_threshold, plan.n_total, plan.waiting_period_days
        )),
    );

    output::success(&format!(
        "Plan '{name}' created: {k} of {n} trustees must approve, {days} day waiting period",
        k = plan.k_threshold,
        n = plan.n_total,
        days = plan.waiting_period_days
    ));
    output::info(&format!("Plan id: {}", plan.id));
    output::tip("Send each trustee their public-key confirmation; shares stay encrypted until the plan triggers.");

    Ok(())
}

/// Execute `plan list`.
pub fn execute_list(cli: &Cli) -> Result<()> {
    let plans = plan_store(cli)?.list_plans()?;
    output::print_plans_table(&plans);
    Ok(())
}

/// Execute `plan status`.
pub fn execute_status(cli: &Cli, plan_id: &str) -> Result<()> {
    let report = plan_store(cli)?.get_plan_status(plan_id, Utc::now())?;
    output::print_plan_status(&report);
    Ok(())
}

/// Execute `plan approve`.
pub fn execute_approve(cli: &Cli, plan_id: &str, trustee_email: &str) -> Result<()> {
    let store = plan_store(cli)?;
    let plan = store.get_plan(plan_id)?;

    let trustee = plan
        .trustees
        .iter()
        .find(|t| t.email == trustee_email)
        .ok_or_else(|| HeirVaultError::TrusteeNotFound(trustee_email.to_string()))?;

    let recorded = store.approve_plan(plan_id, &trustee.id, Utc::now())?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &vault_dir(cli)?,
        "plan-approve",
        Some(plan_id),
        Some(trustee_email),
        Some(if recorded { "recorded" } else { "duplicate (no effect)" }),
    );

    if recorded {
        let report = store.get_plan_status(plan_id, Utc::now())?;
        output::success(&format!(
            "Approval recorded for {trustee_email} ({}/{} required)",
            report.progress.approved, report.progress.required
        ));
        if report.progress.can_trigger {
            output::info("Quorum and waiting period are satisfied — the plan can be triggered.");
        }
    } else {
        output::info(&format!(
            "{trustee_email} had already approved — nothing changed."
        ));
    }

    Ok(())
}

/// Execute `plan trigger`.
pub fn execute_trigger(
    cli: &Cli,
    plan_id: &str,
    reason: &str,
    emergency_override: bool,
) -> Result<()> {
    let store = plan_store(cli)?;

    if emergency_override {
        output::warning(
            "Emergency override is recorded in the audit trail; it does not bypass the quorum or waiting period.",
        );
    }

    store.trigger_inheritance(plan_id, reason, Utc::now())?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &vault_dir(cli)?,
        "plan-trigger",
        Some(plan_id),
        None,
        Some(&format!(
            "reason: {reason}{}",
            if emergency_override {
                " [emergency override]"
            } else {
                ""
            }
        )),
    );

    output::success("Plan triggered — beneficiaries may now collect trustee shares.");
    output::tip("Export the encrypted shares with `heirvault plan shares <PLAN_ID>`.");

    Ok(())
}

/// Execute `plan cancel`.
pub fn execute_cancel(cli: &Cli, plan_id: &str) -> Result<()> {
    plan_store(cli)?.cancel_plan(plan_id)?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(&vault_dir(cli)?, "plan-cancel", Some(plan_id), None, None);

    output::success("Plan cancelled.");
    Ok(())
}

/// Execute `plan complete`.
pub fn execute_complete(cli: &Cli, plan_id: &str) -> Result<()> {
    plan_store(cli)?.complete_plan(plan_id, Utc::now())?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(&vault_dir(cli)?, "plan-complete", Some(plan_id), None, None);

    output::success("Plan marked completed.");
    Ok(())
}

/// Execute `plan edit`.
///
/// Any change to the threshold or the trustee set invalidates every
/// existing share, so the master key is re-split and re-wrapped, and
/// all approvals reset.
pub fn execute_edit(
    cli: &Cli,
    plan_id: &str,
    threshold: Option<u8>,
    trustee_specs: &[String],
) -> Result<()> {
    let store = plan_store(cli)?;
    let mut plan = store.get_plan(plan_id)?;

    if !plan.can_edit() {
        return Err(HeirVaultError::InvalidTransition {
            action: "edit",
            status: plan.status.to_string(),
        });
    }

    // Need the master key to re-split.
    let path = vault_path(cli)?;
    let vault_id = path.to_string_lossy();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    let vault = VaultStore::open(&path, passphrase.as_bytes())?;

    let k_threshold = threshold.unwrap_or(plan.k_threshold);

    // New trustee set from specs, or re-use the stored public keys when
    // only the threshold changes.
    let inputs: Vec<TrusteeInput> = if trustee_specs.is_empty() {
        plan.trustees
            .iter()
            .map(|t| {
                Ok(TrusteeInput {
                    email: t.email.clone(),
                    name: t.name.clone(),
                    public_key: import_public_key(&t.public_key_pem)?,
                })
            })
            .collect::<Result<_>>()?
    } else {
        load_trustee_inputs(trustee_specs)?
    };

    let (trustees, commitment) =
        distribute_shares(vault.master_key(), k_threshold, plan_id, &inputs)?;
    plan.replace_shares(k_threshold, trustees, commitment)?;

    store.update_plan(&plan)?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &vault_dir(cli)?,
        "plan-edit",
        Some(plan_id),
        None,
        Some(&format!(
            "re-split {}-of-{}, approvals reset",
            plan.k_threshold, plan.n_total
        )),
    );

    output::success(&format!(
        "Plan re-distributed: {} of {} trustees, all approvals reset",
        plan.k_threshold, plan.n_total
    ));

    Ok(())
}

/// Execute `plan delete`.
pub fn execute_delete(cli: &Cli, plan_id: &str, force: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete plan {plan_id}? Trustee shares become useless."))
            .default(false)
            .interact()
            .map_err(|e| HeirVaultError::CommandFailed(format!("confirmation: {e}")))?;
        if !confirmed {
            return Err(HeirVaultError::UserCancelled);
        }
    }

    plan_store(cli)?.delete_plan(plan_id)?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(&vault_dir(cli)?, "plan-delete", Some(plan_id), None, None);

    output::success("Plan deleted.");
    Ok(())
}

/// Execute `plan shares` — export the encrypted trustee shares.
pub fn execute_shares(cli: &Cli, plan_id: &str, output_dir: &str) -> Result<()> {
    let shares = plan_store(cli)?.get_trustee_shares(plan_id)?;

    let dir = Path::new(output_dir);
    fs::create_dir_all(dir)?;

    for share in &shares {
        let file = dir.join(format!(
            "{}-share{}.json",
            share.trustee_email.replace('@', "_at_"),
            share.share_index
        ));
        let json = serde_json::to_string_pretty(share)
            .map_err(|e| HeirVaultError::SerializationError(format!("share: {e}")))?;
        fs::write(&file, json)?;
        output::info(&format!("Wrote {}", file.display()));
    }

    output::success(&format!(
        "{} encrypted shares exported — send each trustee their own file only.",
        shares.len()
    ));

    Ok(())
}

/// Execute `plan reconstruct` — combine decrypted shares and release
/// the plan's items.
pub fn execute_reconstruct(
    cli: &Cli,
    plan_id: &str,
    share_files: &[String],
    output_dir: &str,
) -> Result<()> {
    let store = plan_store(cli)?;
    let plan = store.get_plan(plan_id)?;

    if plan.status != crate::plan::PlanStatus::Triggered {
        return Err(HeirVaultError::InvalidTransition {
            action: "reconstruct",
            status: plan.status.to_string(),
        });
    }

    // 1. Read the decrypted share files (base64 of `index || data`).
    let mut shares = Vec::with_capacity(share_files.len());
    for file in share_files {
        let text = fs::read_to_string(file)?;
        let bytes = BASE64
            .decode(text.trim().as_bytes())
            .map_err(|e| HeirVaultError::InvalidInput(format!("{file}: invalid base64: {e}")))?;
        shares.push(SecretShare::from_bytes(&bytes)?);
    }

    if shares.len() < usize::from(plan.k_threshold) {
        return Err(HeirVaultError::InsufficientShares {
            required: usize::from(plan.k_threshold),
            provided: shares.len(),
        });
    }

    // 2. Recombine and verify against the plan's commitment before
    //    trusting the result.
    let recombined = sharing::combine(&shares)?;
    plan.share_commitment.verify(&recombined)?;

    let key_bytes: [u8; 32] = recombined.as_slice().try_into().map_err(|_| {
        HeirVaultError::InvalidInput("recombined key has the wrong length".into())
    })?;
    let master_key = crate::crypto::keys::MasterKey::new(key_bytes);

    // 3. Open the vault with the reconstructed key and write out the
    //    plan's items.
    let vault = VaultStore::open_with_master_key(&vault_path(cli)?, master_key)?;

    let dir = Path::new(output_dir);
    fs::create_dir_all(dir)?;

    let metadata = vault.list_items();
    let mut released = 0usize;
    for item_id in &plan.item_ids {
        let Some(meta) = metadata.iter().find(|m| &m.id == item_id) else {
            output::warning(&format!("Item {item_id} is no longer in the vault — skipped."));
            continue;
        };
        let payload = vault.get_item_by_id(item_id)?;
        let file = dir.join(&meta.name);
        fs::write(&file, payload)?;
        output::info(&format!("Released {}", file.display()));
        released += 1;
    }

    // 4. Close the loop: the plan is complete.
    store.complete_plan(plan_id, Utc::now())?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &vault_dir(cli)?,
        "plan-reconstruct",
        Some(plan_id),
        None,
        Some(&format!("{released} items released")),
    );

    output::success(&format!(
        "Reconstruction verified — {released} items released to {output_dir}/"
    ));

    Ok(())
}
