//! End-to-end tests for the `storeguard` binary.

mod common;

use common::TestContext;
use predicates::prelude::*;
use serde_json::Value;
use storeguard_authz::Role;
use storeguard_test_utils::{identity, storefront};

fn json_stdout(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_catalog_lists_builtin_permissions() {
    let ctx = TestContext::new();
    ctx.command()
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("PERMISSION"))
        .stdout(predicate::str::contains("products:manage"))
        .stdout(predicate::str::contains("Permission to manage products"));
}

#[test]
fn test_catalog_json_matches_builtin_catalog() {
    let ctx = TestContext::new();
    let output = ctx
        .command()
        .args(["catalog", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let permissions = json_stdout(&output);
    let permissions = permissions.as_array().unwrap();
    let expected = storefront();
    assert_eq!(permissions.len(), expected.catalog().len());
    assert_eq!(permissions[0]["id"], 1);
    assert_eq!(permissions[0]["is_system"], true);
}

#[test]
fn test_catalog_for_role_as_json() {
    let ctx = TestContext::new();
    let output = ctx
        .command()
        .args(["catalog", "--role", "guest", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let permissions = json_stdout(&output);
    let keys: Vec<String> = permissions
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            let resource = p["resource"].as_str().unwrap();
            let action = p["action"].as_str().unwrap();
            format!("{resource}:{action}")
        })
        .collect();
    assert_eq!(keys, ["products:read", "categories:read", "reviews:read"]);

    let expected: Vec<String> = identity("g", Role::Guest)
        .permissions
        .iter()
        .map(|p| p.key().to_string())
        .collect();
    assert_eq!(keys, expected);
}

#[test]
fn test_roles_shows_owned_grants() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["roles", "seller"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("seller\n"))
        .stdout(predicate::str::contains("(own)"));
}

#[test]
fn test_check_respects_ownership() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["check", "seller", "products:update", "--id", "s1", "--owner", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("granted"));

    ctx.command()
        .args(["check", "seller", "products:update", "--id", "s1", "--owner", "s2"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("denied"));
}

#[test]
fn test_check_owner_ignored_for_unscoped_grant() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["check", "support", "orders:read", "--id", "sup-1", "--owner", "cust-9"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("granted"));
}

#[test]
fn test_check_exit_status_on_denial() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["check", "guest", "settings:read", "--exit-status"])
        .assert()
        .code(10)
        .stdout(predicate::str::contains("denied"));
}

#[test]
fn test_check_while_impersonating() {
    let ctx = TestContext::new();
    let output = ctx
        .command()
        .args([
            "check", "support", "orders:read", "--id", "op", "--as-role", "user", "--as-id",
            "u-55", "--owner", "u-55", "--format", "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result = json_stdout(&output);
    assert_eq!(result["granted"], true);
    assert_eq!(result["actor_id"], "op");
    assert_eq!(result["identity_id"], "u-55");
    assert_eq!(result["role"], "user");
    assert_eq!(result["impersonating"], true);
}

#[test]
fn test_impersonation_flags_go_together() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["check", "support", "orders:read", "--as-role", "user"])
        .assert()
        .failure();
}

#[test]
fn test_access_levels() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["access", "products", "update", "--role", "support"])
        .assert()
        .success()
        .stdout(predicate::str::contains("products:update for support: read_only"));

    ctx.command()
        .args(["access", "orders", "update", "--role", "support"])
        .assert()
        .success()
        .stdout(predicate::str::contains(": full"));

    ctx.command()
        .args(["access", "products"])
        .assert()
        .success()
        .stdout(predicate::str::contains("products:read for anonymous: hidden"));
}

#[test]
fn test_route_match_reports_params() {
    let ctx = TestContext::new();
    let output = ctx
        .command()
        .args(["route", "seller", "/seller/42", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let decision = json_stdout(&output);
    assert_eq!(decision["can_access"], true);
    assert_eq!(decision["matched"], "/seller/:id");
    assert_eq!(decision["params"]["id"], "42");
}

#[test]
fn test_route_denial_redirects() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["route", "user", "/seller/42", "--exit-status"])
        .assert()
        .code(10)
        .stdout(predicate::str::starts_with("deny /seller/42 for user"))
        .stdout(predicate::str::contains("-> /"));
}

#[test]
fn test_unmatched_route_is_allowed_by_default() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["route", "guest", "/not/configured", "--exit-status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no matching route"));
}

#[test]
fn test_project_policy_is_picked_up() {
    let ctx = TestContext::new().with_policy("unmatched_routes: deny\n");
    ctx.command()
        .args(["route", "super_admin", "/not/configured", "--exit-status"])
        .assert()
        .code(10)
        .stdout(predicate::str::contains("no route configuration matches"));
}

#[test]
fn test_policy_from_environment() {
    let ctx = TestContext::new();
    let path = ctx.write_file(
        "custom.yaml",
        r#"
roles:
  - role: guest
    grants:
      - resource: banners
        actions: [read]
routes: []
"#,
    );
    ctx.command()
        .env("STOREGUARD_POLICY", &path)
        .args(["check", "guest", "banners:read", "--exit-status"])
        .assert()
        .success();
}

#[test]
fn test_validate_builtin_policy() {
    let ctx = TestContext::new();
    ctx.command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in policy"))
        .stdout(predicate::str::contains("8 roles"));
}

#[test]
fn test_validate_reports_validation_error() {
    let ctx = TestContext::new().with_policy(
        r#"
roles:
  - role: seller
  - role: seller
routes: []
"#,
    );
    ctx.command()
        .arg("validate")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("error[E004]"))
        .stderr(predicate::str::contains("seller"));
}

#[test]
fn test_validate_reports_parse_error_as_config_error() {
    let ctx = TestContext::new();
    let path = ctx.write_file("broken.yaml", "roles:\n  - role: wizard\n");
    ctx.command()
        .args(["validate", "--policy"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[E001]"))
        .stderr(predicate::str::contains("wizard"));
}

#[test]
fn test_missing_explicit_policy() {
    let ctx = TestContext::new();
    ctx.command()
        .args(["validate", "--policy", "missing.yaml", "--format", "json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\"code\":\"E001\""));
}

#[test]
fn test_undefined_role_filter_is_a_user_error() {
    let ctx = TestContext::new().with_policy(
        r#"
roles:
  - role: guest
routes: []
"#,
    );
    ctx.command()
        .args(["catalog", "--role", "admin"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Defined roles: guest"));
}
