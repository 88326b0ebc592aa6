//! CLI integration tests for the unprivileged hostward commands.
//!
//! Each test builds its own working tree in a temp directory. Backups use a
//! stand-in for `ssh` that runs the remote command on the local host.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use serde_json::Value;

const ARCHIVE_NAME_PATTERN: &str = r"^tzero-\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}\.tgz$";

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let ctx = Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        };
        ctx.temp_dir
            .child("remote/tzero/a.txt")
            .write_str("0123456789")
            .expect("write a.txt");
        ctx.temp_dir
            .child("remote/tzero/sub/b.txt")
            .write_str("abcdefghijklmnopqrst")
            .expect("write b.txt");
        ctx.write_config("");
        ctx
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn config_path(&self) -> PathBuf {
        self.root().join("hostward.toml")
    }

    fn backup_dir(&self) -> PathBuf {
        self.root().join("bkp")
    }

    /// Writes hostward.toml with backup settings pointing into the temp dir,
    /// followed by `extra`.
    fn write_config(&self, extra: &str) {
        let content = format!(
            r#"{extra}

[backup]
remote_host = "db.example.com"
remote_dir = "{remote}"
local_dir = "bkp"
ssh_command = ["sh", "-c", 'exec sh -c "$2"', "fake-ssh"]
"#,
            remote = self.root().join("remote/tzero").display(),
        );
        fs::write(self.config_path(), content).expect("write config");
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("hostward").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .env("HOME", self.root())
            .env_remove("RUST_LOG")
            .current_dir(self.root())
            .arg("--config")
            .arg(self.config_path());
        cmd
    }

    fn backup(&self) -> assert_cmd::assert::Assert {
        self.cmd().arg("backup").assert()
    }

    fn archives(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.backup_dir())
            .map(|entries| {
                entries
                    .map(|e| e.expect("dir entry").file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[test]
fn test_backup_creates_timestamped_archive() {
    let ctx = TestContext::new();

    ctx.backup()
        .success()
        .stdout(predicate::str::contains("Created"))
        .stdout(predicate::str::contains("sha256:"))
        .stdout(predicate::str::contains("total"));

    let archives = ctx.archives();
    assert_eq!(archives.len(), 1);
    assert!(
        predicate::str::is_match(ARCHIVE_NAME_PATTERN)
            .unwrap()
            .eval(&archives[0]),
        "unexpected archive name {}",
        archives[0]
    );

    let restore = ctx.root().join("restore");
    let file = File::open(ctx.backup_dir().join(&archives[0])).expect("open archive");
    tar::Archive::new(GzDecoder::new(file))
        .unpack(&restore)
        .expect("unpack archive");
    assert_eq!(
        fs::read(restore.join("tzero/a.txt")).expect("read a.txt"),
        b"0123456789"
    );
    assert_eq!(
        fs::read(restore.join("tzero/sub/b.txt")).expect("read b.txt"),
        b"abcdefghijklmnopqrst"
    );
}

#[test]
fn test_backup_verify_lists_contents() {
    let ctx = TestContext::new();
    ctx.backup().success();
    let archive = ctx.backup_dir().join(&ctx.archives()[0]);

    ctx.cmd()
        .args(["backup", "--verify"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("tzero/sub/b.txt"))
        .stdout(predicate::str::contains("2 file(s)"));

    let output = ctx
        .cmd()
        .args(["backup", "--json", "--verify"])
        .arg(&archive)
        .output()
        .expect("run verify");
    let entries: Value = serde_json::from_slice(&output.stdout).expect("parse JSON");
    let a = entries
        .as_array()
        .expect("entries not an array")
        .iter()
        .find(|e| e["path"] == "tzero/a.txt")
        .expect("a.txt missing");
    assert_eq!(a["size_bytes"], 10);
}

#[test]
fn test_backup_verify_rejects_corrupt_archive() {
    let ctx = TestContext::new();
    let bogus = ctx.root().join("bogus.tgz");
    fs::write(&bogus, "not an archive").expect("write bogus");

    ctx.cmd()
        .args(["backup", "--verify"])
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid archive"));
}

#[test]
fn test_backup_failure_keeps_partial_file() {
    let ctx = TestContext::new();
    fs::remove_dir_all(ctx.root().join("remote")).expect("remove remote");

    ctx.backup()
        .failure()
        .stderr(predicate::str::contains("partial archive left at"));
    assert_eq!(ctx.archives().len(), 1);
}

#[test]
fn test_backup_list() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["backup", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no archives)"));

    ctx.backup().success();

    let output = ctx
        .cmd()
        .args(["backup", "--list", "--json"])
        .output()
        .expect("run list");
    let listed: Value = serde_json::from_slice(&output.stdout).expect("parse JSON");
    let listed = listed.as_array().expect("listing not an array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], ctx.archives()[0].as_str());
}

#[test]
fn test_check_secrets() {
    let ctx = TestContext::new();
    ctx.temp_dir
        .child("tzero.py")
        .write_str("import json\n")
        .expect("write tzero.py");
    ctx.temp_dir
        .child("README.md")
        .write_str("Put the password in tzero.json\n")
        .expect("write README.md");

    ctx.cmd()
        .arg("check-secrets")
        .assert()
        .success()
        .stdout(predicate::str::contains("No secrets found"));

    ctx.temp_dir
        .child("tzero.py")
        .write_str("import json\nPASSWORD = 'hunter2'\n")
        .expect("write tzero.py");

    ctx.cmd()
        .arg("check-secrets")
        .assert()
        .failure()
        .stdout(predicate::str::contains("tzero.py:2: contains 'password'"))
        .stderr(predicate::str::contains("found 1 secret occurrence(s)"));
}

#[test]
fn test_lint_reports_tool_failure() {
    let ctx = TestContext::new();
    ctx.write_config(
        r#"[checks]
lint = ["sh", "-c", "exit 4"]
test = ["sh", "-c", "test -f hostward.toml"]"#,
    );

    ctx.cmd()
        .arg("lint")
        .assert()
        .failure()
        .stderr(predicate::str::contains("lint failed"));
    ctx.cmd().arg("test").assert().success();
}

#[test]
fn test_missing_config_file() {
    let ctx = TestContext::new();
    Command::cargo_bin("hostward")
        .expect("failed to find binary")
        .current_dir(ctx.root())
        .args(["--config", "does-not-exist.toml", "backup", "--list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_invalid_service_name() {
    let ctx = TestContext::new();
    ctx.write_config(r#"name = "Not Valid""#);

    ctx.cmd()
        .args(["backup", "--list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_uninstall_requires_confirmation_flag() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args(["uninstall", "--non-interactive"])
        .assert()
        .failure();
}
