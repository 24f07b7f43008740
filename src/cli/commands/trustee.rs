//! `heirvault trustee` — trustee-side key generation and share decryption.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::cli::output;
use crate::cli::Cli;
use crate::errors::{HeirVaultError, Result};
use crate::trustee::envelope::{decrypt_share, EncryptedShare};
use crate::trustee::keys::{import_private_key, TrusteeKeyPair};

/// Execute `trustee keygen`.
///
/// Writes `<prefix>.pub.pem` (share with the vault owner) and
/// `<prefix>.key.pem` (keep private) with restrictive permissions.
pub fn execute_keygen(_cli: &Cli, out_prefix: &str) -> Result<()> {
    let pub_path = format!("{out_prefix}.pub.pem");
    let key_path = format!("{out_prefix}.key.pem");

    for path in [&pub_path, &key_path] {
        if Path::new(path).exists() {
            return Err(HeirVaultError::CommandFailed(format!(
                "{path} already exists — refusing to overwrite key material"
            )));
        }
    }

    let pair = TrusteeKeyPair::generate();

    fs::write(&pub_path, pair.public_key_pem())?;
    fs::write(&key_path, pair.private_key_pem())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o600))?;
    }

    output::success(&format!("Key pair written: {pub_path} / {key_path}"));
    output::tip("Send the .pub.pem to the vault owner. The .key.pem never leaves this machine.");

    Ok(())
}

/// Execute `trustee decrypt-share`.
///
/// Reads an encrypted share file exported by `plan shares`, decrypts it
/// with the trustee's private key, and writes the decrypted share
/// (base64) for the beneficiary to collect.
pub fn execute_decrypt_share(
    _cli: &Cli,
    share_file: &str,
    key_path: &str,
    out_path: &str,
) -> Result<()> {
    let share_json = fs::read_to_string(share_file)?;
    let encrypted: EncryptedShare = serde_json::from_str(&share_json)
        .map_err(|e| HeirVaultError::SerializationError(format!("{share_file}: {e}")))?;

    let pem = fs::read_to_string(key_path)
        .map_err(|e| HeirVaultError::KeyImport(format!("cannot read {key_path}: {e}")))?;
    let secret = import_private_key(&pem)?;

    let share_bytes = decrypt_share(&encrypted, &secret)?;

    fs::write(out_path, BASE64.encode(&share_bytes))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(out_path, fs::Permissions::from_mode(0o600))?;
    }

    output::success(&format!(
        "Share #{} decrypted to {out_path}",
        encrypted.share_index
    ));
    output::tip("Hand this file to the beneficiary through a channel you trust.");

    Ok(())
}
