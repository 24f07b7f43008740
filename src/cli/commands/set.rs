//! `heirvault set` — store an item (add or update).

use std::fs;

use crate::cli::output;
use crate::cli::{prompt_passphrase_for_vault, vault_path, Cli};
use crate::errors::{HeirVaultError, Result};
use crate::vault::VaultStore;

/// Execute the `set` command.
pub fn execute(cli: &Cli, name: &str, value: Option<&str>, from_file: Option<&str>) -> Result<()> {
    let path = vault_path(cli)?;

    // Resolve the payload: inline value, file contents, or prompt.
    let payload: Vec<u8> = match (value, from_file) {
        (Some(v), _) => v.as_bytes().to_vec(),
        (None, Some(file)) => fs::read(file)?,
        (None, None) => {
            let v = dialoguer::Password::new()
                .with_prompt(format!("Value for '{name}'"))
                .interact()
                .map_err(|e| HeirVaultError::CommandFailed(format!("value prompt: {e}")))?;
            v.into_bytes()
        }
    };

    // Open the vault (requires passphrase).
    let vault_id = path.to_string_lossy();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    let mut store = VaultStore::open(&path, passphrase.as_bytes())?;

    let updating = store.contains_item(name);
    let id = store.set_item(name, &payload)?;
    store.save()?;

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &crate::cli::vault_dir(cli)?,
        "set",
        None,
        Some(name),
        Some(if updating { "updated" } else { "added" }),
    );
    #[cfg(not(feature = "audit-log"))]
    let _ = updating;

    output::success(&format!("Item '{name}' stored (id {id})"));

    Ok(())
}
