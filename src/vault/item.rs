//! VaultItem and VaultItemMetadata types stored inside a vault.
//!
//! Each item holds a stable id (referenced by inheritance plans), a
//! human-readable name, its sealed payload, and timestamps.  Plans only
//! ever carry the id — never any part of the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::content::SealedItem;

/// A single encrypted item stored in the vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultItem {
    /// Stable identifier (UUID string), referenced by plans.
    pub id: String,

    /// Human-readable name (e.g. "house-deed").
    pub name: String,

    /// The payload sealed under its own content key.
    pub sealed: SealedItem,

    /// When this item was first created.
    pub created_at: DateTime<Utc>,

    /// When this item was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Lightweight metadata about an item (no ciphertext).
///
/// Returned by `VaultStore::list_items` so callers can display item
/// names and timestamps without touching any ciphertext.
#[derive(Debug, Clone)]
pub struct VaultItemMetadata {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
