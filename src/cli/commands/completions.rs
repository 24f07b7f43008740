//! `heirvault completions` — generate shell completion scripts.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{HeirVaultError, Result};

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let shell: Shell = shell.parse().map_err(|_| {
        HeirVaultError::CommandFailed(format!(
            "unsupported shell '{shell}' — use bash, zsh, fish, or powershell"
        ))
    })?;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "heirvault", &mut std::io::stdout());

    Ok(())
}
