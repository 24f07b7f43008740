//! Vault module — encrypted item storage.
//!
//! This module provides:
//! - `VaultItem` and `VaultItemMetadata` types (`item`)
//! - Binary vault file format with HMAC integrity (`format`)
//! - High-level `VaultStore` for creating, opening, and managing vaults (`store`)

pub mod format;
pub mod item;
pub mod store;

// Re-export the most commonly used items.
pub use format::{StoredArgon2Params, VaultHeader};
pub use item::{VaultItem, VaultItemMetadata};
pub use store::VaultStore;
