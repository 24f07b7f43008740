//! `heirvault get` — decrypt and print a single item.

use std::io::Write;

use crate::cli::{prompt_passphrase_for_vault, vault_path, Cli};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `get` command.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let path = vault_path(cli)?;

    // Open the vault (requires passphrase).
    let vault_id = path.to_string_lossy();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;
    let store = VaultStore::open(&path, passphrase.as_bytes())?;

    // Decrypt and write the payload to stdout.  Raw write, not
    // println: item payloads may be binary.
    let payload = store.get_item(name)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&payload)?;
    if !payload.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }

    Ok(())
}
