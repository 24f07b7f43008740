//! `heirvault delete` — remove an item from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{prompt_passphrase_for_vault, vault_path, Cli};
use crate::errors::{HeirVaultError, Result};
use crate::vault::VaultStore;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    let path = vault_path(cli)?;

    let vault_id = path.to_string_lossy();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    let mut store = VaultStore::open(&path, passphrase.as_bytes())?;

    if !store.contains_item(name) {
        return Err(HeirVaultError::ItemNotFound(name.to_string()));
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete item '{name}'? Plans referencing it will no longer release it."))
            .default(false)
            .interact()
            .map_err(|e| HeirVaultError::CommandFailed(format!("confirmation: {e}")))?;
        if !confirmed {
            return Err(HeirVaultError::UserCancelled);
        }
    }

    store.delete_item(name)?;
    store.save()?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(&crate::cli::vault_dir(cli)?, "delete", None, Some(name), None);

    output::success(&format!("Item '{name}' deleted"));

    Ok(())
}
