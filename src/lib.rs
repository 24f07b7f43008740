pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod plan;
pub mod recovery;
pub mod sharing;
pub mod trustee;
pub mod vault;

#[cfg(feature = "audit-log")]
pub mod audit;

#[cfg(feature = "keyring-store")]
pub mod keyring;
