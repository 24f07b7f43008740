//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` wraps the binary format layer and the crypto layer so
//! that the rest of the application can work with simple method calls
//! like `store.set_item("house-deed", contents)`.  Every item is
//! sealed under its own content key; the master key only ever wraps
//! those content keys.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::crypto::content;
use crate::crypto::kdf::{derive_master_key_with_params, generate_salt, Argon2Params};
use crate::crypto::keys::MasterKey;
use crate::errors::{HeirVaultError, Result};

use super::format::{self, StoredArgon2Params, VaultHeader, CURRENT_VERSION};
use super::item::{VaultItem, VaultItemMetadata};

/// The main vault handle.  Create one with `VaultStore::create` or
/// `VaultStore::open`, then use its methods to manage items.
pub struct VaultStore {
    /// Path to the `.vault` file on disk.
    path: PathBuf,

    /// Header metadata (version, salt, owner id, timestamps).
    header: VaultHeader,

    /// In-memory map of item name -> sealed VaultItem.
    items: HashMap<String, VaultItem>,

    /// The derived master key (zeroized on drop).
    master_key: MasterKey,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new vault file at `path`.
    ///
    /// Generates a random salt and a fresh owner id, derives the master
    /// key from the passphrase, and writes an empty vault to disk.
    ///
    /// Pass `None` for `argon2_params` to use sensible defaults.
    pub fn create(
        path: &Path,
        passphrase: &[u8],
        argon2_params: Option<&Argon2Params>,
    ) -> Result<Self> {
        if path.exists() {
            return Err(HeirVaultError::VaultAlreadyExists(path.to_path_buf()));
        }

        // 1. Generate a random salt.
        let salt = generate_salt();

        // 2. Resolve Argon2 params (explicit or defaults).
        let effective_params = argon2_params.copied().unwrap_or_default();

        // 3. Derive the master key.
        let mut master_bytes =
            derive_master_key_with_params(passphrase, &salt, &effective_params)?;
        let master_key = MasterKey::new(master_bytes);
        master_bytes.zeroize();

        // 4. Build the header (store the params so open uses the same).
        let header = VaultHeader {
            version: CURRENT_VERSION,
            salt: salt.to_vec(),
            owner_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            argon2_params: Some(StoredArgon2Params {
                memory_kib: effective_params.memory_kib,
                iterations: effective_params.iterations,
                parallelism: effective_params.parallelism,
            }),
        };

        let mut store = Self {
            path: path.to_path_buf(),
            header,
            items: HashMap::new(),
            master_key,
        };

        // 5. Persist the empty vault to disk.
        store.save()?;

        Ok(store)
    }

    /// Open an existing vault file, verifying its integrity.
    ///
    /// Reads the binary file, derives the master key from the
    /// passphrase + stored salt (using stored Argon2 params), and
    /// verifies the HMAC **over the original bytes from disk**.  A
    /// wrong passphrase fails here with `HmacMismatch` — derivation
    /// itself never errors on a wrong passphrase.
    pub fn open(path: &Path, passphrase: &[u8]) -> Result<Self> {
        // 1. Read the binary vault file (raw bytes preserved).
        let raw = format::read_vault(path)?;

        // 2. Derive the master key using the stored Argon2 params.
        let stored = raw.header.argon2_params.unwrap_or_default();
        let params = Argon2Params {
            memory_kib: stored.memory_kib,
            iterations: stored.iterations,
            parallelism: stored.parallelism,
        };
        let mut master_bytes =
            derive_master_key_with_params(passphrase, &raw.header.salt, &params)?;
        let master_key = MasterKey::new(master_bytes);
        master_bytes.zeroize();

        // 3. Verify the HMAC over the *original raw bytes* from disk.
        //    This avoids the re-serialization round-trip bug where
        //    serde_json might produce different byte output.
        let mut hmac_key = master_key.derive_hmac_key()?;
        format::verify_hmac(
            &hmac_key,
            &raw.header_bytes,
            &raw.items_bytes,
            &raw.stored_hmac,
        )?;
        hmac_key.zeroize();

        // 4. Build the in-memory map.
        let items: HashMap<String, VaultItem> = raw
            .items
            .into_iter()
            .map(|item| (item.name.clone(), item))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            header: raw.header,
            items,
            master_key,
        })
    }

    /// Open a vault with an already-reconstructed master key.
    ///
    /// Used after a recovery-kit restore or a beneficiary share
    /// reconstruction, where no passphrase is available.  The HMAC
    /// check still runs, so a wrong key is rejected the same way a
    /// wrong passphrase would be.
    pub fn open_with_master_key(path: &Path, master_key: MasterKey) -> Result<Self> {
        let raw = format::read_vault(path)?;

        let mut hmac_key = master_key.derive_hmac_key()?;
        format::verify_hmac(
            &hmac_key,
            &raw.header_bytes,
            &raw.items_bytes,
            &raw.stored_hmac,
        )?;
        hmac_key.zeroize();

        let items: HashMap<String, VaultItem> = raw
            .items
            .into_iter()
            .map(|item| (item.name.clone(), item))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            header: raw.header,
            items,
            master_key,
        })
    }

    // ------------------------------------------------------------------
    // Item operations
    // ------------------------------------------------------------------

    /// Add or update an item, returning its stable id.
    ///
    /// A fresh content key is generated on every write; updating an
    /// existing item keeps its id and `created_at`.
    pub fn set_item(&mut self, name: &str, plaintext: &[u8]) -> Result<String> {
        Self::validate_item_name(name)?;

        let sealed = content::seal(&self.master_key, plaintext)?;
        let now = Utc::now();

        let (id, created_at) = match self.items.get(name) {
            Some(existing) => (existing.id.clone(), existing.created_at),
            None => (Uuid::new_v4().to_string(), now),
        };

        let item = VaultItem {
            id: id.clone(),
            name: name.to_string(),
            sealed,
            created_at,
            updated_at: now,
        };

        self.items.insert(name.to_string(), item);
        Ok(id)
    }

    /// Decrypt and return an item's plaintext payload.
    pub fn get_item(&self, name: &str) -> Result<Vec<u8>> {
        Self::validate_item_name(name)?;
        let item = self
            .items
            .get(name)
            .ok_or_else(|| HeirVaultError::ItemNotFound(name.to_string()))?;

        content::open(&self.master_key, &item.sealed)
    }

    /// Decrypt an item by its stable id (used after reconstruction,
    /// when a beneficiary only has plan item ids).
    pub fn get_item_by_id(&self, id: &str) -> Result<Vec<u8>> {
        let item = self
            .items
            .values()
            .find(|item| item.id == id)
            .ok_or_else(|| HeirVaultError::ItemNotFound(id.to_string()))?;

        content::open(&self.master_key, &item.sealed)
    }

    /// Look up an item's id by name (metadata only, no decryption).
    pub fn item_id(&self, name: &str) -> Result<String> {
        self.items
            .get(name)
            .map(|item| item.id.clone())
            .ok_or_else(|| HeirVaultError::ItemNotFound(name.to_string()))
    }

    /// Remove an item from the vault.
    pub fn delete_item(&mut self, name: &str) -> Result<()> {
        Self::validate_item_name(name)?;
        if self.items.remove(name).is_none() {
            return Err(HeirVaultError::ItemNotFound(name.to_string()));
        }
        Ok(())
    }

    /// List metadata for all items, sorted by name.
    pub fn list_items(&self) -> Vec<VaultItemMetadata> {
        let mut list: Vec<VaultItemMetadata> = self
            .items
            .values()
            .map(|item| VaultItemMetadata {
                id: item.id.clone(),
                name: item.name.clone(),
                created_at: item.created_at,
                updated_at: item.updated_at,
            })
            .collect();

        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    // ------------------------------------------------------------------
    // Passphrase rotation
    // ------------------------------------------------------------------

    /// Change the vault passphrase.
    ///
    /// Generates a new salt, derives a new master key, and re-wraps
    /// each item's content key.  Payload ciphertexts are untouched, so
    /// rotation cost is independent of item sizes.
    pub fn rotate_passphrase(
        &mut self,
        new_passphrase: &[u8],
        argon2_params: &Argon2Params,
    ) -> Result<()> {
        let new_salt = generate_salt();
        let mut master_bytes =
            derive_master_key_with_params(new_passphrase, &new_salt, argon2_params)?;
        let new_master = MasterKey::new(master_bytes);
        master_bytes.zeroize();

        for item in self.items.values_mut() {
            item.sealed = content::rewrap(&self.master_key, &new_master, &item.sealed)?;
        }

        self.header.salt = new_salt.to_vec();
        self.header.argon2_params = Some(StoredArgon2Params {
            memory_kib: argon2_params.memory_kib,
            iterations: argon2_params.iterations,
            parallelism: argon2_params.parallelism,
        });
        self.master_key = new_master;

        self.save()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Serialize the vault and write it to disk atomically.
    ///
    /// Computes a fresh HMAC over the header + items JSON and writes
    /// the full binary envelope via temp-file + rename.
    pub fn save(&mut self) -> Result<()> {
        // Collect items into a sorted Vec for deterministic output.
        let mut item_list: Vec<VaultItem> = self.items.values().cloned().collect();
        item_list.sort_by(|a, b| a.name.cmp(&b.name));

        let mut hmac_key = self.master_key.derive_hmac_key()?;

        format::write_vault(&self.path, &self.header, &item_list, &hmac_key)?;
        hmac_key.zeroize();

        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stable owner id recorded at creation.
    pub fn owner_id(&self) -> &str {
        &self.header.owner_id
    }

    /// Returns the KDF salt (non-secret, needed by recovery kits).
    pub fn salt(&self) -> &[u8] {
        &self.header.salt
    }

    /// Returns the in-memory master key.
    ///
    /// Used to split the key for plans and recovery kits; the key never
    /// leaves this handle otherwise.
    pub fn master_key(&self) -> &MasterKey {
        &self.master_key
    }

    /// Returns the number of items in the vault.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the vault creation timestamp.
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.header.created_at
    }

    /// Returns `true` if the vault contains an item with the given name.
    ///
    /// This is a metadata-only check — no decryption is performed.
    pub fn contains_item(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validate that an item name is safe.
    ///
    /// Allowed: ASCII letters, digits, underscores, hyphens, periods.
    /// Must be non-empty and at most 256 characters.
    fn validate_item_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(HeirVaultError::CommandFailed(
                "item name cannot be empty".into(),
            ));
        }
        if name.len() > 256 {
            return Err(HeirVaultError::CommandFailed(
                "item name cannot exceed 256 characters".into(),
            ));
        }
        if !name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
        {
            return Err(HeirVaultError::CommandFailed(format!(
                "item name '{name}' contains invalid characters — only ASCII letters, digits, underscores, hyphens, and periods are allowed"
            )));
        }
        Ok(())
    }
}
