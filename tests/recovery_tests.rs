//! Integration tests for recovery kits: generate, serialize, restore.

use heirvault::crypto::keys::MasterKey;
use heirvault::crypto::Argon2Params;
use heirvault::errors::HeirVaultError;
use heirvault::recovery::{generate, restore, KitConfig, RecoveryKitBundle, KIT_VERSION};
use heirvault::vault::VaultStore;
use tempfile::TempDir;

fn fast_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

#[test]
fn default_kit_is_three_of_five() {
    let master = MasterKey::new([0x09u8; 32]);
    let bundle = generate(
        "owner-1",
        "owner@example.com",
        &master,
        &[0x01; 32],
        "kit passphrase",
        KitConfig::default(),
        &fast_params(),
    )
    .expect("generate");

    assert_eq!(bundle.vault_master_key_shares.len(), 5);
    assert_eq!(bundle.version, KIT_VERSION);
    assert_eq!(bundle.user_id, "owner-1");
    assert!(!bundle.instructions.is_empty());

    // Each share wraps under its own salt.
    let mut salts: Vec<_> = bundle
        .vault_master_key_shares
        .iter()
        .map(|s| s.salt.clone())
        .collect();
    salts.sort();
    salts.dedup();
    assert_eq!(salts.len(), 5, "per-share salts must be unique");
}

#[test]
fn any_threshold_subset_restores() {
    let master = MasterKey::new([0x0Au8; 32]);
    let bundle = generate(
        "owner-1",
        "owner@example.com",
        &master,
        &[0x02; 32],
        "kit passphrase",
        KitConfig::default(),
        &fast_params(),
    )
    .expect("generate");

    for subset in [[1u8, 2, 3], [1, 3, 5], [2, 4, 5]] {
        let (restored, salt) = restore(&bundle, &subset, "kit passphrase").expect("restore");
        assert_eq!(restored.as_bytes(), master.as_bytes());
        assert_eq!(salt, vec![0x02; 32]);
    }
}

#[test]
fn restore_errors_are_precise() {
    let master = MasterKey::new([0x0Bu8; 32]);
    let bundle = generate(
        "owner-1",
        "owner@example.com",
        &master,
        &[0x03; 32],
        "kit passphrase",
        KitConfig::default(),
        &fast_params(),
    )
    .expect("generate");

    // Fewer than two shares.
    assert!(matches!(
        restore(&bundle, &[2], "kit passphrase"),
        Err(HeirVaultError::InsufficientShares {
            required: 2,
            provided: 1
        })
    ));

    // Unknown share index.
    assert!(matches!(
        restore(&bundle, &[1, 9], "kit passphrase"),
        Err(HeirVaultError::InvalidInput(_))
    ));

    // Wrong passphrase fails on the authentication tag.
    assert!(matches!(
        restore(&bundle, &[1, 2, 3], "not the passphrase"),
        Err(HeirVaultError::DecryptionFailed)
    ));

    // Two of a 3-of-5 kit: mechanically combines, caught by commitment.
    assert!(matches!(
        restore(&bundle, &[1, 2], "kit passphrase"),
        Err(HeirVaultError::CommitmentMismatch)
    ));
}

#[test]
fn bundle_survives_json_roundtrip() {
    let master = MasterKey::new([0x0Cu8; 32]);
    let bundle = generate(
        "owner-1",
        "owner@example.com",
        &master,
        &[0x04; 32],
        "kit passphrase",
        KitConfig {
            threshold: 2,
            total: 4,
        },
        &fast_params(),
    )
    .expect("generate");

    let json = bundle.to_json().expect("to_json");
    assert!(json.contains("vault_master_key_shares"));
    assert!(json.contains("instructions"));

    let parsed = RecoveryKitBundle::from_json(&json).expect("from_json");
    let (restored, _) = restore(&parsed, &[1, 4], "kit passphrase").expect("restore");
    assert_eq!(restored.as_bytes(), master.as_bytes());
}

#[test]
fn restored_key_opens_the_vault() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("items.vault");

    let mut store =
        VaultStore::create(&path, b"vault passphrase", Some(&fast_params())).expect("create");
    store.set_item("letter", b"to my family").expect("set");
    store.save().expect("save");

    let bundle = generate(
        store.owner_id(),
        "owner@example.com",
        store.master_key(),
        store.salt(),
        "kit passphrase",
        KitConfig::default(),
        &fast_params(),
    )
    .expect("generate");
    drop(store);

    // Lose the vault passphrase; restore from the kit instead.
    let (master, _salt) = restore(&bundle, &[1, 2, 3], "kit passphrase").expect("restore");
    let reopened = VaultStore::open_with_master_key(&path, master).expect("open");
    assert_eq!(reopened.get_item("letter").expect("get"), b"to my family");
}
