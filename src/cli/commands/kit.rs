//! `heirvault kit` — owner recovery kits.

use std::fs;

use crate::cli::output;
use crate::cli::{
    prompt_kit_passphrase, prompt_new_passphrase, prompt_passphrase_for_vault, vault_path, Cli,
};
use crate::config::Settings;
use crate::errors::Result;
use crate::recovery::{self, KitConfig, RecoveryKitBundle};
use crate::vault::VaultStore;

/// Execute `kit generate`.
pub fn execute_generate(
    cli: &Cli,
    email: &str,
    total: Option<u8>,
    threshold: Option<u8>,
    out_path: &str,
) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;

    let config = KitConfig {
        threshold: threshold.unwrap_or(settings.default_threshold),
        total: total.unwrap_or(settings.default_total_shares),
    };

    // 1. Open the vault to get the master key and its salt.
    let path = vault_path(cli)?;
    let vault_id = path.to_string_lossy();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    let store = VaultStore::open(&path, passphrase.as_bytes())?;

    // 2. The kit gets its own passphrase, independent of the vault's.
    output::info("Choose a kit passphrase. It protects the kit's shares and must survive losing the vault passphrase.");
    let kit_passphrase = prompt_kit_passphrase(true)?;

    // 3. Split, wrap, and serialize.
    let bundle = recovery::generate(
        store.owner_id(),
        email,
        store.master_key(),
        store.salt(),
        &kit_passphrase,
        config,
        &settings.argon2_params(),
    )?;

    fs::write(out_path, bundle.to_json()?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(out_path, fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &crate::cli::vault_dir(cli)?,
        "kit-generate",
        None,
        Some(out_path),
        Some(&format!("{}-of-{} shares", config.threshold, config.total)),
    );

    output::success(&format!(
        "Recovery kit written to {out_path} ({} of {} shares needed to restore)",
        config.threshold, config.total
    ));
    output::warning("Split the shares across separate locations. Anyone with the kit file AND the kit passphrase can rebuild your master key.");

    Ok(())
}

/// Execute `kit restore`.
pub fn execute_restore(
    cli: &Cli,
    kit_file: &str,
    share_indices: &[u8],
    set_new_passphrase: bool,
) -> Result<()> {
    let bundle = RecoveryKitBundle::from_json(&fs::read_to_string(kit_file)?)?;

    let kit_passphrase = prompt_kit_passphrase(false)?;

    // Unwrap, recombine, and verify against the kit's commitment.
    let (master_key, _salt) = recovery::restore(&bundle, share_indices, &kit_passphrase)?;

    output::success("Master key reconstructed and verified against the kit's commitment.");

    // If a local vault exists, prove the key actually opens it.
    let path = vault_path(cli)?;
    if !path.exists() {
        output::info("No local vault file found; the key was verified against the kit only.");
        return Ok(());
    }

    let mut store = VaultStore::open_with_master_key(&path, master_key)?;
    output::success(&format!(
        "Vault opened with the restored key ({} items intact).",
        store.item_count()
    ));

    if set_new_passphrase {
        output::info("Choose a new vault passphrase.");
        let new_passphrase = prompt_new_passphrase("Choose new vault passphrase")?;

        let cwd = std::env::current_dir()?;
        let settings = Settings::load(&cwd)?;
        store.rotate_passphrase(new_passphrase.as_bytes(), &settings.argon2_params())?;

        output::success("Vault re-encrypted under the new passphrase.");
        output::warning("This kit and any trustee shares now reconstruct a stale key — regenerate them.");
    }

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &crate::cli::vault_dir(cli)?,
        "kit-restore",
        None,
        Some(kit_file),
        Some(&format!("{} shares supplied", share_indices.len())),
    );

    Ok(())
}
