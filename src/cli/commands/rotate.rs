//! `heirvault rotate-key` — change the vault master passphrase.
//!
//! Derives a new master key from the new passphrase and re-wraps each
//! item's content key.  Payload ciphertexts are untouched, so this is
//! fast no matter how large the items are.
//!
//! Rotation invalidates the shares held by plan trustees and any
//! recovery kits: they reconstruct the OLD master key, which no longer
//! opens the vault.  Active plans are re-distributed automatically with
//! `plan edit`; kits must be regenerated by hand.

use crate::cli::output;
use crate::cli::{prompt_new_passphrase, prompt_passphrase_for_vault, vault_path, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `rotate-key` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let path = vault_path(cli)?;

    // 1. Open the vault with the current passphrase.
    output::info("Enter your current vault passphrase.");
    let vault_id = path.to_string_lossy();
    let old_passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    let mut store = VaultStore::open(&path, old_passphrase.as_bytes())?;

    // 2. Prompt for the new passphrase.
    output::info("Choose your new vault passphrase.");
    let new_passphrase = prompt_new_passphrase("Choose new vault passphrase")?;

    // 3. Load settings for Argon2 params, then rotate and save.
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    store.rotate_passphrase(new_passphrase.as_bytes(), &settings.argon2_params())?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &crate::cli::vault_dir(cli)?,
        "rotate-key",
        None,
        None,
        Some(&format!("{} content keys re-wrapped", store.item_count())),
    );

    output::success(&format!(
        "Passphrase rotated ({} content keys re-wrapped)",
        store.item_count()
    ));
    output::warning(
        "Existing trustee shares and recovery kits now reconstruct a stale key.",
    );
    output::tip("Re-distribute active plans with `heirvault plan edit` and regenerate kits with `heirvault kit generate`.");

    Ok(())
}
