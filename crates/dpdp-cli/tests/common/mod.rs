//! Shared helpers for driving the `dpdp` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::{tempdir, TempDir};

/// A scratch directory with its own database and config.
pub struct TestContext {
    pub temp_dir: TempDir,
    pub database: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let database = temp_dir.path().join("dpdp.db");
        Self { temp_dir, database }
    }

    /// Write `.dpdp/config.yaml` in the scratch directory.
    pub fn with_config(self, yaml: &str) -> Self {
        let dir = self.path().join(".dpdp");
        std::fs::create_dir_all(&dir).expect("Failed to create config dir");
        std::fs::write(dir.join("config.yaml"), yaml).expect("Failed to write config");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A command isolated from the caller's environment.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("dpdp").expect("Binary not found");
        cmd.current_dir(self.path())
            .env_remove("DPDP_CONFIG")
            .env_remove("DPDP_DATABASE_PATH")
            .env_remove("DPDP_ENV")
            .env_remove("RUST_LOG")
            .env("DPDP_LOG_LEVEL", "error")
            .arg("--database")
            .arg(&self.database);
        cmd
    }

    /// Run a command with `--format json` and parse its stdout.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .command()
            .args(["--format", "json"])
            .args(args)
            .output()
            .expect("Failed to run dpdp");
        assert!(
            output.status.success(),
            "dpdp {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout was not JSON")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
