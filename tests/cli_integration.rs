//! Integration tests for the HeirVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Interactive prompts are bypassed via the `HEIRVAULT_PASSPHRASE` and
//! `HEIRVAULT_KIT_PASSPHRASE` environment variables.

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSPHRASE: &str = "correct horse battery";

/// Helper: get a Command pointing at the heirvault binary, rooted in
/// the given temp directory with a fast-KDF config and a scripted
/// passphrase.
fn heirvault(tmp: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("heirvault").expect("binary should exist");
    cmd.current_dir(tmp.path());
    cmd.env("HEIRVAULT_PASSPHRASE", PASSPHRASE);
    cmd.env("HEIRVAULT_KIT_PASSPHRASE", "kit passphrase here");
    cmd
}

/// Write a `.heirvault.toml` with cheap Argon2 parameters so the test
/// suite stays fast.
fn write_fast_config(tmp: &TempDir) {
    std::fs::write(
        tmp.path().join(".heirvault.toml"),
        "argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n",
    )
    .unwrap();
}

#[test]
fn help_flag_shows_usage() {
    let tmp = TempDir::new().unwrap();
    heirvault(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Digital inheritance vault with k-of-n trustee recovery",
        ))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("trustee"))
        .stdout(predicate::str::contains("kit"))
        .stdout(predicate::str::contains("rotate-key"));
}

#[test]
fn version_flag_shows_version() {
    let tmp = TempDir::new().unwrap();
    heirvault(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("heirvault"));
}

#[test]
fn no_args_shows_help() {
    let tmp = TempDir::new().unwrap();
    heirvault(&tmp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn get_on_missing_vault_fails() {
    let tmp = TempDir::new().unwrap();
    write_fast_config(&tmp);

    heirvault(&tmp)
        .args(["get", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault not found"));
}

#[test]
fn init_set_get_list_happy_path() {
    let tmp = TempDir::new().unwrap();
    write_fast_config(&tmp);

    heirvault(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));

    assert!(tmp.path().join(".heirvault/items.vault").exists());

    heirvault(&tmp)
        .args(["set", "house-deed", "lot 42, block 7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored"));

    heirvault(&tmp)
        .args(["get", "house-deed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lot 42, block 7"));

    heirvault(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("house-deed"));
}

#[test]
fn init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    write_fast_config(&tmp);

    heirvault(&tmp).arg("init").assert().success();
    heirvault(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn wrong_passphrase_is_rejected() {
    let tmp = TempDir::new().unwrap();
    write_fast_config(&tmp);

    heirvault(&tmp).arg("init").assert().success();
    heirvault(&tmp)
        .args(["set", "note", "hello"])
        .assert()
        .success();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("heirvault").unwrap();
    cmd.current_dir(tmp.path())
        .env("HEIRVAULT_PASSPHRASE", "not the passphrase")
        .args(["get", "note"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HMAC"));
}

/// The full escrow loop: keygen, plan create, approvals, trigger,
/// share export, trustee decryption, beneficiary reconstruction.
#[test]
fn full_inheritance_flow() {
    let tmp = TempDir::new().unwrap();
    write_fast_config(&tmp);

    heirvault(&tmp).arg("init").assert().success();
    heirvault(&tmp)
        .args(["set", "letter", "to my family"])
        .assert()
        .success();

    // Two trustees generate key pairs.
    for name in ["alice", "bob"] {
        heirvault(&tmp)
            .args(["trustee", "keygen", "--out", name])
            .assert()
            .success();
        assert!(tmp.path().join(format!("{name}.pub.pem")).exists());
        assert!(tmp.path().join(format!("{name}.key.pem")).exists());
    }

    // Owner creates a 2-of-2 plan with no waiting period (so the test
    // can trigger immediately).
    heirvault(&tmp)
        .args([
            "plan",
            "create",
            "estate",
            "-k",
            "2",
            "--waiting-days",
            "0",
            "--trustee",
            "alice@example.com:alice.pub.pem:Alice",
            "--trustee",
            "bob@example.com:bob.pub.pem:Bob",
            "--beneficiary",
            "heir@example.com:Jamie:child",
            "--item",
            "letter",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 2 trustees"));

    // Find the plan id from the plan store directory.
    let plans_dir = tmp.path().join(".heirvault/plans");
    let plan_file = std::fs::read_dir(&plans_dir)
        .unwrap()
        .next()
        .expect("one plan file")
        .unwrap()
        .path();
    let plan_id = plan_file.file_stem().unwrap().to_string_lossy().to_string();

    // Trigger before quorum is rejected.
    heirvault(&tmp)
        .args(["plan", "trigger", &plan_id, "--reason", "owner deceased"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quorum not met"));

    // Both trustees approve; the second approval is idempotent.
    for email in ["alice@example.com", "bob@example.com"] {
        heirvault(&tmp)
            .args(["plan", "approve", &plan_id, "--trustee-email", email])
            .assert()
            .success();
    }
    heirvault(&tmp)
        .args([
            "plan",
            "approve",
            &plan_id,
            "--trustee-email",
            "alice@example.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("already approved"));

    // Trigger now succeeds.
    heirvault(&tmp)
        .args(["plan", "trigger", &plan_id, "--reason", "owner deceased"])
        .assert()
        .success()
        .stdout(predicate::str::contains("triggered"));

    // Export the encrypted shares.
    heirvault(&tmp)
        .args(["plan", "shares", &plan_id, "--output-dir", "out-shares"])
        .assert()
        .success();

    // Each trustee decrypts their own share.
    heirvault(&tmp)
        .args([
            "trustee",
            "decrypt-share",
            "out-shares/alice_at_example.com-share1.json",
            "--key",
            "alice.key.pem",
            "--out",
            "alice-share.txt",
        ])
        .assert()
        .success();
    heirvault(&tmp)
        .args([
            "trustee",
            "decrypt-share",
            "out-shares/bob_at_example.com-share2.json",
            "--key",
            "bob.key.pem",
            "--out",
            "bob-share.txt",
        ])
        .assert()
        .success();

    // Beneficiary combines the decrypted shares and receives the items.
    heirvault(&tmp)
        .args([
            "plan",
            "reconstruct",
            &plan_id,
            "--share",
            "alice-share.txt",
            "--share",
            "bob-share.txt",
            "--output-dir",
            "inherited",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 items released"));

    let released = std::fs::read_to_string(tmp.path().join("inherited/letter")).unwrap();
    assert_eq!(released, "to my family");

    // The plan is now completed.
    heirvault(&tmp)
        .args(["plan", "status", &plan_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));
}

/// Recovery-kit loop: generate, then restore with a subset of shares.
#[test]
fn kit_generate_and_restore() {
    let tmp = TempDir::new().unwrap();
    write_fast_config(&tmp);

    heirvault(&tmp).arg("init").assert().success();
    heirvault(&tmp)
        .args(["set", "note", "remember this"])
        .assert()
        .success();

    heirvault(&tmp)
        .args([
            "kit",
            "generate",
            "--email",
            "owner@example.com",
            "--out",
            "kit.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recovery kit written"));

    heirvault(&tmp)
        .args([
            "kit",
            "restore",
            "kit.json",
            "--share-index",
            "1",
            "--share-index",
            "3",
            "--share-index",
            "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Master key reconstructed"))
        .stdout(predicate::str::contains("1 items intact"));

    // A single share is refused.
    heirvault(&tmp)
        .args(["kit", "restore", "kit.json", "--share-index", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient shares"));
}
