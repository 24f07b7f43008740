//! `heirvault list` — list item metadata.

use crate::cli::output;
use crate::cli::{prompt_passphrase_for_vault, vault_path, Cli};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let path = vault_path(cli)?;

    let vault_id = path.to_string_lossy();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    let store = VaultStore::open(&path, passphrase.as_bytes())?;

    output::print_items_table(&store.list_items());

    Ok(())
}
