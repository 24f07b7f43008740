//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use clap::Parser;

use zeroize::Zeroizing;

use crate::errors::{HeirVaultError, Result};

/// Minimum passphrase length to prevent trivially weak passphrases.
const MIN_PASSPHRASE_LEN: usize = 8;

/// HeirVault CLI: digital inheritance vault with k-of-n trustee recovery.
#[derive(Parser)]
#[command(
    name = "heirvault",
    about = "Digital inheritance vault with k-of-n trustee recovery",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: .heirvault)
    #[arg(long, default_value = ".heirvault", global = true)]
    pub vault_dir: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Initialize a new vault
    Init,

    /// Store an item (add or update)
    Set {
        /// Item name (e.g. house-deed)
        name: String,
        /// Item value (omit for interactive prompt)
        value: Option<String>,
        /// Read the value from a file instead
        #[arg(long, conflicts_with = "value")]
        from_file: Option<String>,
    },

    /// Decrypt and print an item
    Get {
        /// Item name
        name: String,
    },

    /// List all items
    List,

    /// Delete an item
    Delete {
        /// Item name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the vault's master passphrase (re-wraps content keys)
    RotateKey,

    /// Manage inheritance plans
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Trustee-side operations (key generation, share decryption)
    Trustee {
        #[command(subcommand)]
        action: TrusteeAction,
    },

    /// Owner recovery kits (self-service master-key backup)
    Kit {
        #[command(subcommand)]
        action: KitAction,
    },

    /// View the audit log of vault and plan operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },

    /// Show version information
    Version,
}

/// Plan subcommands.
#[derive(clap::Subcommand)]
pub enum PlanAction {
    /// Create a plan: split the master key and wrap one share per trustee
    Create {
        /// Plan name
        name: String,

        /// Approval threshold k (default from config)
        #[arg(short = 'k', long)]
        threshold: Option<u8>,

        /// Waiting period in days (default from config)
        #[arg(long)]
        waiting_days: Option<u32>,

        /// Trustee spec `email:pubkey.pem[:name]` (repeat per trustee)
        #[arg(long = "trustee", required = true)]
        trustees: Vec<String>,

        /// Beneficiary spec `email[:name[:relationship]]` (repeatable)
        #[arg(long = "beneficiary")]
        beneficiaries: Vec<String>,

        /// Vault item names to place under this plan (repeatable)
        #[arg(long = "item")]
        items: Vec<String>,
    },

    /// List all plans
    List,

    /// Show one plan's status and approval progress
    Status {
        /// Plan id
        plan_id: String,
    },

    /// Record a trustee's approval
    Approve {
        /// Plan id
        plan_id: String,
        /// Trustee email
        #[arg(long)]
        trustee_email: String,
    },

    /// Trigger the plan (requires quorum + elapsed waiting period)
    Trigger {
        /// Plan id
        plan_id: String,
        /// Human-readable reason, recorded in the audit trail
        #[arg(long)]
        reason: String,
        /// Flag the trigger as an emergency (recorded, does not bypass checks)
        #[arg(long)]
        emergency_override: bool,
    },

    /// Cancel the plan (only while active)
    Cancel {
        /// Plan id
        plan_id: String,
    },

    /// Mark the plan completed after a successful reconstruction
    Complete {
        /// Plan id
        plan_id: String,
    },

    /// Edit a plan: change threshold/trustees and re-distribute shares
    Edit {
        /// Plan id
        plan_id: String,

        /// New approval threshold k
        #[arg(short = 'k', long)]
        threshold: Option<u8>,

        /// Replacement trustee specs `email:pubkey.pem[:name]`
        #[arg(long = "trustee")]
        trustees: Vec<String>,
    },

    /// Delete the plan (only from active or cancelled)
    Delete {
        /// Plan id
        plan_id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export the encrypted trustee shares (after trigger)
    Shares {
        /// Plan id
        plan_id: String,
        /// Directory to write one share file per trustee
        #[arg(long, default_value = "shares")]
        output_dir: String,
    },

    /// Combine decrypted shares, verify, and unlock the plan's items
    Reconstruct {
        /// Plan id
        plan_id: String,
        /// Decrypted share file (repeat; need at least the threshold)
        #[arg(long = "share", required = true)]
        shares: Vec<String>,
        /// Directory to write the decrypted items to
        #[arg(long, default_value = "inherited")]
        output_dir: String,
    },
}

/// Trustee subcommands.
#[derive(clap::Subcommand)]
pub enum TrusteeAction {
    /// Generate a trustee key pair as PEM files
    Keygen {
        /// Output path prefix (writes <prefix>.pub.pem and <prefix>.key.pem)
        #[arg(long, default_value = "trustee")]
        out: String,
    },

    /// Decrypt this trustee's share from an exported share file
    DecryptShare {
        /// Encrypted share file (as written by `plan shares`)
        share_file: String,
        /// Path to the trustee's private key PEM
        #[arg(long)]
        key: String,
        /// Output path for the decrypted share
        #[arg(long, default_value = "share.txt")]
        out: String,
    },
}

/// Recovery kit subcommands.
#[derive(clap::Subcommand)]
pub enum KitAction {
    /// Generate a password-protected recovery kit for the master key
    Generate {
        /// Owner email recorded in the kit
        #[arg(long)]
        email: String,
        /// Number of shares (default from config)
        #[arg(short = 'n', long)]
        total: Option<u8>,
        /// Reconstruction threshold (default from config)
        #[arg(short = 'k', long)]
        threshold: Option<u8>,
        /// Output path for the kit JSON
        #[arg(long, default_value = "recovery-kit.json")]
        out: String,
    },

    /// Restore the master key from a recovery kit
    Restore {
        /// Path to the kit JSON
        kit_file: String,
        /// Share indices to use (repeat; at least 2)
        #[arg(long = "share-index", required = true)]
        share_indices: Vec<u8>,
        /// Re-encrypt the vault under a fresh passphrase after restoring
        #[arg(long)]
        new_passphrase: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the vault passphrase, trying in order:
/// 1. `HEIRVAULT_PASSPHRASE` env var (CI/scripts)
/// 2. OS keyring (if compiled with `keyring-store` feature)
/// 3. Interactive prompt
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase_for_vault(vault_id: Option<&str>) -> Result<Zeroizing<String>> {
    // 1. Check the environment variable first (CI/scripts friendly).
    if let Ok(pw) = std::env::var("HEIRVAULT_PASSPHRASE") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    // 2. Try the OS keyring (if feature enabled and vault_id provided).
    #[cfg(feature = "keyring-store")]
    if let Some(id) = vault_id {
        match crate::keyring::get_passphrase(id) {
            Ok(Some(pw)) => return Ok(Zeroizing::new(pw)),
            Ok(None) => {} // No stored passphrase, continue to prompt.
            Err(_) => {}   // Keyring unavailable, continue to prompt.
        }
    }

    // Suppress unused variable warning when keyring feature is off.
    #[cfg(not(feature = "keyring-store"))]
    let _ = vault_id;

    // 3. Fall back to interactive prompt.
    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault passphrase")
        .interact()
        .map_err(|e| HeirVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation (used during `init`).
///
/// Also respects `HEIRVAULT_PASSPHRASE` for scripted usage.
/// Enforces a minimum passphrase length.
pub fn prompt_new_passphrase(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("HEIRVAULT_PASSPHRASE") {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSPHRASE_LEN {
                return Err(HeirVaultError::CommandFailed(format!(
                    "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let passphrase = dialoguer::Password::new()
            .with_prompt(prompt)
            .with_confirmation("Confirm passphrase", "Passphrases do not match, try again")
            .interact()
            .map_err(|e| HeirVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;

        if passphrase.len() < MIN_PASSPHRASE_LEN {
            output::warning(&format!(
                "Passphrase must be at least {MIN_PASSPHRASE_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(passphrase));
    }
}

/// Get the recovery-kit passphrase: `HEIRVAULT_KIT_PASSPHRASE` env var
/// or interactive prompt.  This passphrase is deliberately separate
/// from the vault passphrase: the kit must survive losing the latter.
pub fn prompt_kit_passphrase(confirm: bool) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("HEIRVAULT_KIT_PASSPHRASE") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Enter kit passphrase");
    if confirm {
        prompt = prompt.with_confirmation(
            "Confirm kit passphrase",
            "Passphrases do not match, try again",
        );
    }
    let pw = prompt
        .interact()
        .map_err(|e| HeirVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Build the full path to the vault file from the CLI arguments.
///
/// Example: `<cwd>/.heirvault/items.vault`
pub fn vault_path(cli: &Cli) -> Result<std::path::PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(&cli.vault_dir).join("items.vault"))
}

/// Build the full path to the vault directory.
pub fn vault_dir(cli: &Cli) -> Result<std::path::PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(&cli.vault_dir))
}

/// A parsed `--trustee` argument.
pub struct TrusteeSpec {
    pub email: String,
    pub pubkey_path: String,
    pub name: String,
}

/// Parse a trustee spec of the form `email:pubkey.pem[:name]`.
pub fn parse_trustee_spec(spec: &str) -> Result<TrusteeSpec> {
    let mut parts = spec.splitn(3, ':');
    let email = parts.next().unwrap_or_default().trim();
    let pubkey_path = parts.next().unwrap_or_default().trim();
    let name = parts.next().map(str::trim);

    if email.is_empty() || !email.contains('@') {
        return Err(HeirVaultError::InvalidInput(format!(
            "trustee spec '{spec}' must start with an email address"
        )));
    }
    if pubkey_path.is_empty() {
        return Err(HeirVaultError::InvalidInput(format!(
            "trustee spec '{spec}' is missing a public key path (email:pubkey.pem[:name])"
        )));
    }

    Ok(TrusteeSpec {
        email: email.to_string(),
        pubkey_path: pubkey_path.to_string(),
        name: name
            .filter(|n| !n.is_empty())
            .unwrap_or(email)
            .to_string(),
    })
}

/// A parsed `--beneficiary` argument.
pub struct BeneficiarySpec {
    pub email: String,
    pub name: String,
    pub relationship: String,
}

/// Parse a beneficiary spec of the form `email[:name[:relationship]]`.
pub fn parse_beneficiary_spec(spec: &str) -> Result<BeneficiarySpec> {
    let mut parts = spec.splitn(3, ':');
    let email = parts.next().unwrap_or_default().trim();
    let name = parts.next().map(str::trim).filter(|n| !n.is_empty());
    let relationship = parts.next().map(str::trim).filter(|r| !r.is_empty());

    if email.is_empty() || !email.contains('@') {
        return Err(HeirVaultError::InvalidInput(format!(
            "beneficiary spec '{spec}' must start with an email address"
        )));
    }

    Ok(BeneficiarySpec {
        email: email.to_string(),
        name: name.unwrap_or(email).to_string(),
        relationship: relationship.unwrap_or("unspecified").to_string(),
    })
}
