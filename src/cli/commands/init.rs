//! `heirvault init` — create a new vault.

use std::fs;

use crate::cli::output;
use crate::cli::{prompt_new_passphrase, Cli};
use crate::config::Settings;
use crate::errors::{HeirVaultError, Result};
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let vault_dir = cwd.join(&cli.vault_dir);
    let vault_path = vault_dir.join("items.vault");

    // 1. Create the vault directory if it doesn't exist.
    if !vault_dir.exists() {
        fs::create_dir_all(&vault_dir)?;
        let dir_display = vault_dir.display();
        output::info(&format!("Created vault directory: {dir_display}"));
    }

    // 2. Check if a vault already exists.
    if vault_path.exists() {
        output::tip("Use `heirvault set` to add items to the existing vault.");
        return Err(HeirVaultError::VaultAlreadyExists(vault_path));
    }

    // 3. Prompt for a new passphrase (with confirmation).
    let passphrase = prompt_new_passphrase("Choose vault passphrase")?;

    // 4. Load settings and create the vault file.
    let settings = Settings::load(&cwd)?;
    let store = VaultStore::create(
        &vault_path,
        passphrase.as_bytes(),
        Some(&settings.argon2_params()),
    )?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(&vault_dir, "init", None, None, Some("vault created"));

    output::success(&format!("Vault created at {}", vault_path.display()));
    output::info(&format!("Owner id: {}", store.owner_id()));
    output::tip("Next: `heirvault set <NAME>` to add items, then `heirvault plan create` to set up inheritance.");

    Ok(())
}
