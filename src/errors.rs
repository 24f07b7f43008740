use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// All errors that can occur in HeirVault.
#[derive(Debug, Error)]
pub enum HeirVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Secret sharing errors ---
    #[error("Invalid threshold: k must be at least 2 (got {0})")]
    InvalidThreshold(u8),

    #[error("Invalid share configuration: total shares ({total}) must be at least the threshold ({threshold})")]
    InvalidConfig { threshold: u8, total: u8 },

    #[error("Too many shares: maximum is {maximum}, got {requested}")]
    TooManyShares { maximum: u8, requested: u8 },

    #[error("Insufficient shares: need at least {required}, got {provided}")]
    InsufficientShares { required: usize, provided: usize },

    #[error("Duplicate share index {0}")]
    DuplicateShareIndex(u8),

    #[error("Reconstructed secret does not match its commitment — wrong or corrupted shares")]
    CommitmentMismatch,

    // --- Trustee key errors ---
    #[error("Key import failed: {0}")]
    KeyImport(String),

    #[error("Keystore error: {0}")]
    Keystore(String),

    #[error("Keystore is locked — call unlock first")]
    KeystoreLocked,

    // --- Plan errors ---
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Trustee '{0}' is not part of this plan")]
    TrusteeNotFound(String),

    #[error("Quorum not met: {approved} of {required} required approvals")]
    QuorumNotMet { approved: usize, required: usize },

    #[error("Waiting period has not elapsed — trigger becomes available at {available_at}")]
    WaitingPeriodNotElapsed { available_at: DateTime<Utc> },

    #[error("Invalid plan transition: cannot {action} a {status} plan")]
    InvalidTransition { action: &'static str, status: String },

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("HMAC verification failed — wrong passphrase or tampered vault file")]
    HmacMismatch,

    #[error("HMAC error: {0}")]
    HmacError(String),

    #[error("Item '{0}' not found")]
    ItemNotFound(String),

    // --- Keyring errors ---
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Convenience type alias for HeirVault results.
pub type Result<T> = std::result::Result<T, HeirVaultError>;
