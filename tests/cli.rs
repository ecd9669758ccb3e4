//! CLI integration tests for the peermark admin commands.
//!
//! Each test seeds its own temp data directory.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

mod common;

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use peermark::store::{MemoryStore, Store};
use predicates::prelude::*;
use serde_json::{Value, json};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn seeded(seed: &Value) -> Self {
        let ctx = Self::new();
        common::write_seed(ctx.data_dir(), seed);
        ctx
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("peermark").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn check(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["admin", "check", "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn token(&self, email: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([
                "admin",
                "token",
                "--data-dir",
                &self.data_dir_str(),
                "--email",
                email,
            ])
            .assert()
    }
}

#[test]
fn test_check_consistent_store() {
    let ctx = TestContext::seeded(&common::seed());
    ctx.check()
        .success()
        .stdout(predicate::str::contains("OK: 6 users"))
        .stdout(predicate::str::contains("3 reviews"));
}

#[test]
fn test_check_reports_dangling_grade() {
    let mut seed = common::seed();
    seed["grades"]
        .as_array_mut()
        .expect("grades array")
        .push(json!({
            "assignment_id": common::ASSIGNMENT,
            "worker_id": "rob",
            "reviewer_id": "carl",
            "criteria_id": "clarity",
            "mark": 0.5,
        }));

    let ctx = TestContext::seeded(&seed);
    ctx.check()
        .failure()
        .stderr(predicate::str::contains("referential inconsistency"));
}

#[test]
fn test_check_missing_store() {
    let ctx = TestContext::new();
    ctx.check()
        .failure()
        .stderr(predicate::str::contains("Store not found"));
}

#[test]
fn test_token_is_printed_and_persisted() {
    let ctx = TestContext::seeded(&common::seed());
    ctx.token("wendy@example.com")
        .success()
        .stdout(predicate::str::contains("peermark_"));

    let store = MemoryStore::open(ctx.data_dir().join("store.json")).expect("reopen store");
    let tokens = store.snapshot().expect("snapshot").tables.tokens;
    assert_eq!(tokens.len(), 1);

    let token = tokens.iter().next().expect("one token");
    assert_eq!(token.email, "wendy@example.com");
    assert!(!token.is_admin);
    assert!(token.token_hash.starts_with("$argon2"));
}

#[test]
fn test_token_for_unknown_email_fails() {
    let ctx = TestContext::seeded(&common::seed());
    ctx.token("nobody@example.com")
        .failure()
        .stderr(predicate::str::contains("no user with email"));
}

#[test]
fn test_token_without_store_fails() {
    let ctx = TestContext::new();
    ctx.token("wendy@example.com")
        .failure()
        .stderr(predicate::str::contains("Store not found"));
}
