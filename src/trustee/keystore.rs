//! Secure storage for private key material.
//!
//! Owner and trustee keys must never share a custody boundary, so the
//! store keeps **distinct domains**: `KeyDomain::Owner` for the vault
//! owner's material and `KeyDomain::Trustee` for same-device trustee
//! private keys.  The trustee domain exists for testing and demos only;
//! in real deployments a trustee's private key stays on the trustee's
//! own device.
//!
//! `FileKeyStore` is the software backend: one file per entry,
//! encrypted under an Argon2id-derived store key, owner-only file
//! permissions.  The lifecycle is explicit: `init` once, `unlock` per
//! session, `wipe` to destroy everything.

use std::fs;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::kdf::{derive_master_key_with_params, generate_salt, Argon2Params};
use crate::errors::{HeirVaultError, Result};

/// Known plaintext sealed at init time so `unlock` can verify the
/// passphrase before any entry is touched.
const VERIFIER_PLAINTEXT: &[u8] = b"heirvault-keystore-v1";

const SALT_FILE: &str = "keystore.salt";
const VERIFIER_FILE: &str = "keystore.verifier";

/// Which custody domain an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDomain {
    /// The vault owner's own key material.
    Owner,
    /// Same-device trustee private keys (testing convenience only).
    Trustee,
}

impl KeyDomain {
    fn dir_name(self) -> &'static str {
        match self {
            KeyDomain::Owner => "owner",
            KeyDomain::Trustee => "trustee",
        }
    }
}

/// Pluggable secure key storage with an explicit lifecycle.
///
/// Backends may be software files, an OS keychain, or hardware; the
/// trait keeps the custody domains and lifecycle uniform.
pub trait SecureKeyStore {
    /// Create the store and set its passphrase.  Fails if it exists.
    fn init(&mut self, passphrase: &str) -> Result<()>;

    /// Unlock an existing store for this session.
    fn unlock(&mut self, passphrase: &str) -> Result<()>;

    /// Persist key bytes under `domain`/`name`.  Requires unlock.
    fn store(&mut self, domain: KeyDomain, name: &str, key_bytes: &[u8]) -> Result<()>;

    /// Load key bytes from `domain`/`name`.  Requires unlock.
    fn load(&self, domain: KeyDomain, name: &str) -> Result<Zeroizing<Vec<u8>>>;

    /// Destroy the store and all entries, and forget the session key.
    fn wipe(&mut self) -> Result<()>;
}

/// Software file-backed keystore.
pub struct FileKeyStore {
    root: PathBuf,
    argon2_params: Argon2Params,
    /// Session store key; `None` while locked.
    store_key: Option<Zeroizing<[u8; 32]>>,
}

impl FileKeyStore {
    /// Create a handle rooted at `root` (nothing is touched on disk
    /// until `init` or `unlock`).
    pub fn new(root: PathBuf, argon2_params: Argon2Params) -> Self {
        Self {
            root,
            argon2_params,
            store_key: None,
        }
    }

    /// True if the store has been initialized on disk.
    pub fn exists(&self) -> bool {
        self.root.join(SALT_FILE).exists()
    }

    fn entry_path(&self, domain: KeyDomain, name: &str) -> Result<PathBuf> {
        validate_entry_name(name)?;
        Ok(self.root.join(domain.dir_name()).join(format!("{name}.key")))
    }

    fn session_key(&self) -> Result<&Zeroizing<[u8; 32]>> {
        self.store_key.as_ref().ok_or(HeirVaultError::KeystoreLocked)
    }

    fn derive_store_key(&self, passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
        let key =
            derive_master_key_with_params(passphrase.as_bytes(), salt, &self.argon2_params)?;
        Ok(Zeroizing::new(key))
    }
}

impl SecureKeyStore for FileKeyStore {
    fn init(&mut self, passphrase: &str) -> Result<()> {
        if self.exists() {
            return Err(HeirVaultError::Keystore(format!(
                "keystore already initialized at {}",
                self.root.display()
            )));
        }

        fs::create_dir_all(self.root.join(KeyDomain::Owner.dir_name()))?;
        fs::create_dir_all(self.root.join(KeyDomain::Trustee.dir_name()))?;

        let salt = generate_salt();
        let key = self.derive_store_key(passphrase, &salt)?;
        let verifier = encrypt(key.as_ref(), VERIFIER_PLAINTEXT)?;

        write_restricted(&self.root.join(SALT_FILE), &salt)?;
        write_restricted(&self.root.join(VERIFIER_FILE), &verifier)?;

        self.store_key = Some(key);
        Ok(())
    }

    fn unlock(&mut self, passphrase: &str) -> Result<()> {
        let salt_path = self.root.join(SALT_FILE);
        if !salt_path.exists() {
            return Err(HeirVaultError::Keystore(format!(
                "no keystore at {}",
                self.root.display()
            )));
        }

        let salt = fs::read(&salt_path)?;
        let key = self.derive_store_key(passphrase, &salt)?;

        // A wrong passphrase derives a key that fails the verifier's
        // authentication tag.
        let verifier = fs::read(self.root.join(VERIFIER_FILE))?;
        decrypt(key.as_ref(), &verifier)?;

        self.store_key = Some(key);
        Ok(())
    }

    fn store(&mut self, domain: KeyDomain, name: &str, key_bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(domain, name)?;
        let sealed = encrypt(self.session_key()?.as_ref(), key_bytes)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_restricted(&path, &sealed)
    }

    fn load(&self, domain: KeyDomain, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        let path = self.entry_path(domain, name)?;
        if !path.exists() {
            return Err(HeirVaultError::Keystore(format!(
                "no key '{name}' in {} domain",
                domain.dir_name()
            )));
        }

        let sealed = fs::read(&path)?;
        let plaintext = decrypt(self.session_key()?.as_ref(), &sealed)?;
        Ok(Zeroizing::new(plaintext))
    }

    fn wipe(&mut self) -> Result<()> {
        self.store_key = None;
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// Write a file with owner-only permissions on Unix.
fn write_restricted(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

/// Validate that an entry name is safe to use as a file name.
fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(HeirVaultError::Keystore("entry name cannot be empty".into()));
    }
    if name.len() > 128 {
        return Err(HeirVaultError::Keystore(
            "entry name cannot exceed 128 characters".into(),
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.' || b == b'@')
    {
        return Err(HeirVaultError::Keystore(format!(
            "entry name '{name}' contains invalid characters"
        )));
    }
    if name.starts_with('.') {
        return Err(HeirVaultError::Keystore(
            "entry name cannot start with a period".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_params() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn store_in(dir: &TempDir) -> FileKeyStore {
        FileKeyStore::new(dir.path().join("keystore"), fast_params())
    }

    #[test]
    fn init_store_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut ks = store_in(&dir);

        ks.init("correct horse").unwrap();
        ks.store(KeyDomain::Owner, "vault", b"owner key bytes").unwrap();

        let loaded = ks.load(KeyDomain::Owner, "vault").unwrap();
        assert_eq!(loaded.as_slice(), b"owner key bytes");
    }

    #[test]
    fn domains_are_separate() {
        let dir = TempDir::new().unwrap();
        let mut ks = store_in(&dir);
        ks.init("pw").unwrap();
        ks.store(KeyDomain::Trustee, "alice", b"trustee key").unwrap();

        assert!(ks.load(KeyDomain::Owner, "alice").is_err());
        assert!(ks.load(KeyDomain::Trustee, "alice").is_ok());
    }

    #[test]
    fn unlock_with_wrong_passphrase_fails() {
        let dir = TempDir::new().unwrap();
        let mut ks = store_in(&dir);
        ks.init("right").unwrap();

        let mut reopened = store_in(&dir);
        assert!(reopened.unlock("wrong").is_err());
        assert!(reopened.unlock("right").is_ok());
    }

    #[test]
    fn locked_store_rejects_access() {
        let dir = TempDir::new().unwrap();
        let mut ks = store_in(&dir);
        ks.init("pw").unwrap();
        ks.store(KeyDomain::Owner, "vault", b"bytes").unwrap();

        let locked = store_in(&dir);
        assert!(matches!(
            locked.load(KeyDomain::Owner, "vault"),
            Err(HeirVaultError::KeystoreLocked)
        ));
    }

    #[test]
    fn wipe_destroys_everything() {
        let dir = TempDir::new().unwrap();
        let mut ks = store_in(&dir);
        ks.init("pw").unwrap();
        ks.store(KeyDomain::Owner, "vault", b"bytes").unwrap();

        ks.wipe().unwrap();
        assert!(!ks.exists());

        let mut reopened = store_in(&dir);
        assert!(reopened.unlock("pw").is_err());
    }

    #[test]
    fn rejects_path_traversal_names() {
        let dir = TempDir::new().unwrap();
        let mut ks = store_in(&dir);
        ks.init("pw").unwrap();
        assert!(ks.store(KeyDomain::Owner, "../escape", b"x").is_err());
        assert!(ks.store(KeyDomain::Owner, "", b"x").is_err());
    }
}
