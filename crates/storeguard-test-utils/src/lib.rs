//! Test utilities for Storeguard crates.

use std::path::PathBuf;
use storeguard_authz::{ActingIdentity, Authorizer, Role};
use tempfile::TempDir;

/// Relative location of the project policy file.
pub const POLICY_FILE: &str = ".storeguard/policy.yaml";

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("test_file");
    std::fs::write(&path, content).expect("Failed to write temp file");
    (dir, path)
}

/// Creates a project directory holding `content` as its policy file.
///
/// Returns the directory guard and the path of the written file.
pub fn temp_policy(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join(POLICY_FILE);
    std::fs::create_dir_all(path.parent().expect("policy path has a parent"))
        .expect("Failed to create policy dir");
    std::fs::write(&path, content).expect("Failed to write policy file");
    (dir, path)
}

/// The built-in storefront authorizer.
pub fn storefront() -> Authorizer {
    Authorizer::storefront().expect("built-in policy is valid")
}

/// An identity for `role` under the built-in policy.
pub fn identity(id: &str, role: Role) -> ActingIdentity {
    storefront().identity(id, role)
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err, optionally matching a pattern.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(_) => {}
        }
    };
    ($expr:expr, $pat:pat) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err($pat) => {}
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    };
}
