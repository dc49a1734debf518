//! Common test utilities for CLI testing.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use storeguard_common_config::vars::STOREGUARD_POLICY;
use storeguard_common_log::vars::{RUST_LOG, STOREGUARD_LOG_LEVEL};
use storeguard_test_utils::{temp_dir, POLICY_FILE};
use tempfile::TempDir;

/// Test context with a temporary project directory
pub struct TestContext {
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            temp_dir: temp_dir(),
        }
    }

    /// Write `.storeguard/policy.yaml` in the project directory
    pub fn with_policy(self, policy: &str) -> Self {
        let path = self.policy_path();
        std::fs::create_dir_all(path.parent().expect("policy path has a parent"))
            .expect("Failed to create policy dir");
        std::fs::write(&path, policy).expect("Failed to write policy");
        self
    }

    /// Write a policy file at `name` outside the default location
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn policy_path(&self) -> PathBuf {
        self.path().join(POLICY_FILE)
    }

    /// Get path to temp directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a command configured for this context
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("storeguard").expect("Binary not found");
        cmd.current_dir(self.path())
            .env_remove(STOREGUARD_POLICY)
            .env_remove(RUST_LOG)
            .env_remove(STOREGUARD_LOG_LEVEL)
            .env("NO_COLOR", "1");
        cmd
    }
}
