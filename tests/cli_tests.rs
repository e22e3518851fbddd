use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command isolated from the user's real config and session
fn seriesctl(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("seriesctl").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    seriesctl(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("seriesctl"))
        .stdout(predicate::str::contains("new"))
        .stdout(predicate::str::contains("rank"));
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    seriesctl(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("seriesctl"));
}

#[test]
fn test_markets_lists_all_marketplaces() {
    let home = TempDir::new().unwrap();
    seriesctl(&home)
        .arg("markets")
        .assert()
        .success()
        .stdout(predicate::str::contains("au: audible.com.au"))
        .stdout(predicate::str::contains("us: audible.com"))
        .stdout(predicate::str::contains("fr: audible.fr"));
}

#[test]
fn test_new_rejects_unknown_marketplace() {
    let home = TempDir::new().unwrap();
    seriesctl(&home)
        .args(["new", "--marketplace", "xx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown marketplace 'xx'"));
}

#[test]
fn test_new_without_marketplace_fails() {
    let home = TempDir::new().unwrap();
    seriesctl(&home)
        .arg("new")
        .assert()
        .failure()
        .stderr(predicate::str::contains("marketplace"));
}

#[test]
fn test_new_requires_login() {
    let home = TempDir::new().unwrap();
    seriesctl(&home)
        .args(["new", "--marketplace", "au"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_rank_requires_login() {
    let home = TempDir::new().unwrap();
    seriesctl(&home)
        .args(["rank", "--marketplace", "au"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_session_for_other_marketplace_is_ignored() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("seriesctl");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("session.json"),
        r#"{"access_token":"abc","marketplace":"us"}"#,
    )
    .unwrap();

    seriesctl(&home)
        .args(["rank", "--marketplace", "uk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_logout_without_session() {
    let home = TempDir::new().unwrap();
    seriesctl(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored session."));
}

#[test]
fn test_logout_removes_session() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("seriesctl");
    fs::create_dir_all(&dir).unwrap();
    let session = dir.join("session.json");
    fs::write(&session, r#"{"access_token":"abc","marketplace":"us"}"#).unwrap();

    seriesctl(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed session"));
    assert!(!session.exists());
}

#[test]
fn test_configured_marketplace_is_marked() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("seriesctl");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "[user]\nmarketplace = \"de\"\n").unwrap();

    seriesctl(&home)
        .arg("markets")
        .assert()
        .success()
        .stdout(predicate::str::contains("(configured)"));
}
