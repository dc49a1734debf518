//! Policy file loading and parsing.

use crate::env::Environment;
use crate::types::PolicyConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use storeguard_authz::{Authorizer, AuthzError};
use thiserror::Error;
use tracing::debug;

/// Directory holding project policy files.
pub const POLICY_DIR: &str = ".storeguard";

/// Policy file name inside [`POLICY_DIR`].
pub const POLICY_FILE_NAME: &str = "policy.yaml";

static ENV_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env reference pattern compiles")
});

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("policy file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read policy: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error(
        "invalid YAML at line {}: {message}",
        line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string())
    )]
    ParseError { line: Option<usize>, message: String },

    #[error("invalid policy: {0}")]
    ValidationError(#[from] AuthzError),

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

impl ConfigError {
    fn parse(err: serde_yaml::Error) -> Self {
        Self::ParseError {
            line: err.location().map(|l| l.line()),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    /// `<dir>/.storeguard/policy.yaml`; absent means built-in.
    Project(PathBuf),
    /// A file named explicitly; absent is an error.
    File(PathBuf),
}

/// Policy file loader.
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    source: Source,
}

impl PolicyLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            source: Source::Project(project_dir.as_ref().to_path_buf()),
        }
    }

    /// Create a loader for an explicit policy file.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self {
            source: Source::File(path.as_ref().to_path_buf()),
        }
    }

    /// Pick the policy source: `explicit`, then `STOREGUARD_POLICY`, then the
    /// current directory's project file.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Environment::policy_path() {
            Some(path) => Self::from_file(path),
            None => Self::default(),
        }
    }

    /// Path the loader reads from.
    pub fn path(&self) -> PathBuf {
        match &self.source {
            Source::Project(dir) => dir.join(POLICY_DIR).join(POLICY_FILE_NAME),
            Source::File(path) => path.clone(),
        }
    }

    /// Load and validate the policy.
    pub fn load(&self) -> Result<PolicyConfig, ConfigError> {
        self.load_validated().map(|(config, _)| config)
    }

    /// Load the policy and build its authorizer.
    pub fn load_authorizer(&self) -> Result<Authorizer, ConfigError> {
        self.load_validated().map(|(_, authz)| authz)
    }

    /// Parse and validate policy text.
    pub fn parse(&self, contents: &str) -> Result<PolicyConfig, ConfigError> {
        self.parse_validated(contents).map(|(config, _)| config)
    }

    fn load_validated(&self) -> Result<(PolicyConfig, Authorizer), ConfigError> {
        let path = self.path();

        if !path.exists() {
            return match self.source {
                Source::Project(_) => {
                    debug!(path = %path.display(), "No policy file, using built-in policy");
                    let config = PolicyConfig::default();
                    let authz = config.build()?;
                    Ok((config, authz))
                }
                Source::File(_) => Err(ConfigError::NotFound { path }),
            };
        }

        debug!(path = %path.display(), "Loading policy file");
        let contents = std::fs::read_to_string(&path)?;
        self.parse_validated(&contents)
    }

    /// Parsing succeeds only if the policy builds; the built authorizer is
    /// returned with it.
    fn parse_validated(&self, contents: &str) -> Result<(PolicyConfig, Authorizer), ConfigError> {
        let expanded = self.expand_env_vars(contents)?;
        let config: PolicyConfig = serde_yaml::from_str(&expanded).map_err(ConfigError::parse)?;
        let authz = config.build()?;
        Ok((config, authz))
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(content.len());
        let mut last = 0;

        for cap in ENV_REF.captures_iter(content) {
            let Some(whole) = cap.get(0) else { continue };
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result.push_str(&content[last..whole.start()]);
            result.push_str(&value);
            last = whole.end();
        }

        result.push_str(&content[last..]);
        Ok(result)
    }

    /// Save the policy to the loader's path.
    pub fn save(&self, config: &PolicyConfig) -> Result<(), ConfigError> {
        let path = self.path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(ConfigError::parse)?;
        std::fs::write(&path, yaml)?;
        debug!(path = %path.display(), "Saved policy file");
        Ok(())
    }
}

impl Default for PolicyLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storeguard_authz::{Action, Resource, Role, UnmatchedRoutePolicy};
    use storeguard_test_utils::{assert_err, assert_ok, temp_dir, temp_file, temp_policy};

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = temp_dir();
        let loader = PolicyLoader::new(dir.path());
        let config = loader.load().unwrap();
        assert!(config.is_builtin());
        assert!(loader.load_authorizer().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = temp_dir();
        let loader = PolicyLoader::from_file(dir.path().join("nope.yaml"));
        assert_err!(loader.load(), ConfigError::NotFound { .. });
    }

    #[test]
    fn test_load_policy_from_project_dir() {
        let (dir, path) = temp_policy(
            r#"
unmatched_routes: deny
roles:
  - role: guest
    grants:
      - resource: products
        actions: [read]
  - role: user
    grants:
      - resource: orders
        actions: [create, read]
        scope: own
routes:
  - path: /checkout
    permissions: ["orders:create"]
    redirect_to: /login
"#,
        );
        let loader = PolicyLoader::new(dir.path());
        assert_eq!(loader.path(), path);

        let authz = loader.load_authorizer().unwrap();
        assert_eq!(authz.unmatched_policy(), UnmatchedRoutePolicy::Deny);
        assert!(authz.can_access_route("/checkout", Role::User).can_access);
        assert!(!authz.can_access_route("/checkout", Role::Guest).can_access);
        assert!(!authz.can_access_route("/elsewhere", Role::User).can_access);

        let user = authz.identity("u1", Role::User);
        assert!(user.can(Resource::Orders, Action::Read, Some("u1")));
        assert!(!user.can(Resource::Orders, Action::Read, Some("u2")));
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("SG_LOADER_TEST_VAR", "test_value");
        let loader = PolicyLoader::new(".");
        let result = loader.expand_env_vars("key: ${SG_LOADER_TEST_VAR}").unwrap();
        assert_eq!(result, "key: test_value");
        std::env::remove_var("SG_LOADER_TEST_VAR");
    }

    #[test]
    fn test_env_var_default() {
        let loader = PolicyLoader::new(".");
        let result = loader
            .expand_env_vars("key: ${SG_LOADER_NONEXISTENT:-default}")
            .unwrap();
        assert_eq!(result, "key: default");
    }

    #[test]
    fn test_env_var_missing_error() {
        let loader = PolicyLoader::new(".");
        match loader.expand_env_vars("key: ${SG_LOADER_MISSING_VAR}") {
            Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "SG_LOADER_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_env_vars_in_single_value() {
        std::env::set_var("SG_LOADER_PREFIX", "/seller");
        std::env::set_var("SG_LOADER_SUFFIX", "orders");

        let loader = PolicyLoader::new(".");
        let result = loader
            .expand_env_vars("path: ${SG_LOADER_PREFIX}/:id/${SG_LOADER_SUFFIX}")
            .unwrap();
        assert_eq!(result, "path: /seller/:id/orders");

        std::env::remove_var("SG_LOADER_PREFIX");
        std::env::remove_var("SG_LOADER_SUFFIX");
    }

    #[test]
    fn test_env_var_expansion_in_policy() {
        std::env::set_var("SG_LOADER_UNMATCHED", "deny");
        let (dir, _path) = temp_policy(
            r#"
unmatched_routes: ${SG_LOADER_UNMATCHED}
routes:
  - path: ${SG_LOADER_LOGIN:-/login}
    require_auth: false
"#,
        );
        let config = assert_ok!(PolicyLoader::new(dir.path()).load());
        assert_eq!(config.unmatched_routes, UnmatchedRoutePolicy::Deny);
        let routes = config.routes.unwrap();
        assert_eq!(routes.routes()[0].pattern.as_str(), "/login");
        std::env::remove_var("SG_LOADER_UNMATCHED");
    }

    #[test]
    fn test_parse_error_with_line_number() {
        let (dir, _path) = temp_policy(
            r#"
roles:
  - role: guest
    grants: [unclosed
"#,
        );
        match PolicyLoader::new(dir.path()).load() {
            Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
            other => panic!("Expected ParseError with line number, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_resource_reports_line() {
        let (dir, _path) = temp_policy(
            r#"roles:
  - role: guest
    grants:
      - resource: widgets
        actions: [read]
"#,
        );
        match PolicyLoader::new(dir.path()).load() {
            Err(ConfigError::ParseError { line, message }) => {
                assert!(line.is_some());
                assert!(message.contains("widgets"));
            }
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_route_pattern_is_rejected() {
        let (dir, _path) = temp_policy(
            r#"
routes:
  - path: /seller/:/orders
"#,
        );
        assert_err!(PolicyLoader::new(dir.path()).load(), ConfigError::ParseError { .. });
    }

    #[test]
    fn test_duplicate_role_is_a_validation_error() {
        let (dir, _path) = temp_policy(
            r#"
roles:
  - role: seller
  - role: seller
routes: []
"#,
        );
        assert_err!(
            PolicyLoader::new(dir.path()).load(),
            ConfigError::ValidationError(AuthzError::DuplicateRole(Role::Seller))
        );
    }

    #[test]
    fn test_route_with_undefined_role_is_a_validation_error() {
        let (dir, _path) = temp_policy(
            r#"
roles:
  - role: guest
routes:
  - path: /admin
    roles: [admin]
"#,
        );
        assert_err!(
            PolicyLoader::new(dir.path()).load(),
            ConfigError::ValidationError(AuthzError::UndefinedRole { .. })
        );
    }

    #[test]
    fn test_save_policy() {
        let dir = temp_dir();
        let loader = PolicyLoader::new(dir.path());

        let mut config = PolicyConfig::storefront().unwrap();
        config.unmatched_routes = UnmatchedRoutePolicy::Deny;
        loader.save(&config).unwrap();

        let policy_path = dir.path().join(".storeguard/policy.yaml");
        assert!(policy_path.exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let (_dir, explicit) = temp_file("unmatched_routes: deny\n");

        let loader = PolicyLoader::resolve(Some(&explicit));
        assert_eq!(loader.path(), explicit);
        assert_eq!(
            assert_ok!(loader.load()).unmatched_routes,
            UnmatchedRoutePolicy::Deny
        );
    }

    #[test]
    fn test_load_authorizer_matches_loaded_policy() {
        let (_dir, path) = temp_file(
            r#"
unmatched_routes: deny
roles:
  - role: guest
    grants:
      - resource: banners
        actions: [read]
routes: []
"#,
        );
        let loader = PolicyLoader::from_file(&path);
        let config = assert_ok!(loader.load());
        let authz = assert_ok!(loader.load_authorizer());

        assert_eq!(authz.unmatched_policy(), config.unmatched_routes);
        assert_eq!(authz.role_table(), &config.role_table());
        assert_eq!(authz.catalog().len(), 1);
        assert!(authz.route_table().is_empty());
    }

    #[test]
    fn test_load_authorizer_reports_validation_error() {
        let (_dir, path) = temp_file(
            r#"
roles:
  - role: guest
routes:
  - path: /admin
    roles: [admin]
"#,
        );
        assert_err!(
            PolicyLoader::from_file(&path).load_authorizer(),
            ConfigError::ValidationError(AuthzError::UndefinedRole { .. })
        );
    }

    #[test]
    fn test_missing_project_file_builds_builtin_policy() {
        let dir = temp_dir();
        let authz = assert_ok!(PolicyLoader::new(dir.path()).load_authorizer());
        assert_eq!(authz.role_table(), &storeguard_authz::defaults::storefront_role_table());
    }
}
