//! Integration tests for the commvault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  Each
//! test gets its own config dir with a fast KDF and a members table, so
//! no interactive input is ever needed.

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

const CONFIG: &str = r#"
kdf_iterations = 1000

[members.garden-club]
olive = "owner"
mel = "member"
vic = "viewer"
"#;

/// A temp project dir with `.commvault.toml` written into it.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(".commvault.toml"), CONFIG).unwrap();
    tmp
}

/// Helper: get a Command pointing at the commvault binary, wired to `dir`.
fn commvault(dir: &TempDir, user: &str) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("commvault").expect("binary should exist");
    cmd.current_dir(dir.path())
        .env("COMMVAULT_MASTER_SECRET", "cli-test-master")
        .env("COMMVAULT_ENV", "development")
        .env("COMMVAULT_COMMUNITY", "garden-club")
        .env("COMMVAULT_USER", user)
        .env_remove("COMMVAULT_LOG");
    cmd
}

/// Create an item and return its id (printed on its own stdout line).
fn create(dir: &TempDir, args: &[&str]) -> String {
    let out = commvault(dir, "olive")
        .arg("create")
        .args(args)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8(out.stdout)
        .unwrap()
        .lines()
        .find(|l| l.len() == 36 && l.chars().filter(|c| *c == '-').count() == 4)
        .expect("id line")
        .to_string()
}

#[test]
fn help_flag_shows_usage() {
    #[allow(deprecated)]
    Command::cargo_bin("commvault")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted per-community secret vault"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("read"))
        .stdout(predicate::str::contains("access-log"));
}

#[test]
fn no_args_shows_help() {
    #[allow(deprecated)]
    Command::cargo_bin("commvault")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn create_then_read_round_trip() {
    let dir = project();
    let id = create(&dir, &["--title", "Shed lock", "--content", "4-8-15"]);

    commvault(&dir, "olive")
        .args(["read", &id, "--quiet"])
        .assert()
        .success()
        .stdout("4-8-15\n");

    assert!(dir.path().join(".commvault").join("vault.db").exists());
}

#[test]
fn content_can_be_piped_on_stdin() {
    let dir = project();
    let out = commvault(&dir, "olive")
        .args(["create", "--title", "piped"])
        .write_stdin("from-stdin\n")
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let id = stdout.lines().find(|l| l.len() == 36).unwrap();

    commvault(&dir, "olive")
        .args(["read", id, "-q"])
        .assert()
        .success()
        .stdout("from-stdin\n");
}

#[test]
fn list_json_hides_encrypted_fields() {
    let dir = project();
    create(&dir, &["--title", "router", "--content", "pw", "--allow-role", "member"]);

    commvault(&dir, "mel")
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"router\""))
        .stdout(predicate::str::contains("\"state\": \"active\""))
        .stdout(predicate::str::contains("ciphertext").not())
        .stdout(predicate::str::contains("salt").not());
}

#[test]
fn denied_reader_gets_error() {
    let dir = project();
    let id = create(&dir, &["--title", "bank", "--content", "1234"]);

    commvault(&dir, "vic")
        .args(["read", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access denied"));
}

#[test]
fn outsider_is_not_a_member() {
    let dir = project();
    commvault(&dir, "mallory")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("garden-club"));
}

#[test]
fn missing_community_is_reported() {
    let dir = project();
    commvault(&dir, "olive")
        .env_remove("COMMVAULT_COMMUNITY")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no community given"));
}

#[test]
fn access_log_shows_reader() {
    let dir = project();
    let id = create(&dir, &["--title", "gate", "--content", "0000", "--allow-user", "mel"]);

    commvault(&dir, "mel").args(["read", &id, "-q"]).assert().success();

    commvault(&dir, "olive")
        .args(["access-log", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("mel"));
}

#[test]
fn forced_delete_removes_item() {
    let dir = project();
    let id = create(&dir, &["--title", "temp", "--content", "x"]);

    commvault(&dir, "olive")
        .args(["delete", &id, "--force"])
        .assert()
        .success();

    commvault(&dir, "olive")
        .args(["read", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn update_changes_content() {
    let dir = project();
    let id = create(&dir, &["--title", "wifi", "--content", "old"]);

    commvault(&dir, "olive")
        .args(["update", &id, "--content", "new"])
        .assert()
        .success();

    commvault(&dir, "olive")
        .args(["read", &id, "-q"])
        .assert()
        .success()
        .stdout("new\n");
}

#[test]
fn production_without_master_secret_fails() {
    let dir = project();
    commvault(&dir, "olive")
        .env_remove("COMMVAULT_MASTER_SECRET")
        .env("COMMVAULT_ENV", "production")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("COMMVAULT_MASTER_SECRET"));
}

#[test]
fn members_lists_roles() {
    let dir = project();
    commvault(&dir, "olive")
        .arg("members")
        .assert()
        .success()
        .stdout(predicate::str::contains("olive"))
        .stdout(predicate::str::contains("viewer"));
}

#[test]
fn completions_generate_for_bash() {
    let dir = project();
    commvault(&dir, "olive")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("commvault"));
}
