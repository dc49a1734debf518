//! Path-based route guard.
//!
//! A [`RouteTable`] maps path patterns to [`RouteConfig`] rules. Patterns are
//! split on `/`; a segment is either a literal or a `:name` parameter that
//! matches any single segment. There is no regex or glob matching.
//!
//! Resolution order for a request path:
//!
//! 1. a pattern equal to the path,
//! 2. the first pattern (in declaration order) with the same number of
//!    segments whose segments all match,
//! 3. otherwise the [`UnmatchedRoutePolicy`].
//!
//! A matched rule is then checked: `require_auth: false` allows outright,
//! the role gate and the permission gate are applied independently, and a
//! failure of either denies with the rule's redirect target.

use crate::error::AuthzError;
use crate::resolver::{has_permission, Ownership};
use crate::types::{Permission, PermissionKey, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Redirect target used when a denying rule does not name one.
pub const DEFAULT_REDIRECT: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn matches(&self, part: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == part,
            Segment::Param(_) => true,
        }
    }
}

/// A validated route pattern such as `/seller/:id/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse and validate a pattern.
    ///
    /// Patterns must start with `/`, must not contain empty segments (other
    /// than the root pattern `/` itself), and parameter names must be
    /// non-empty and unique within the pattern.
    pub fn parse(raw: &str) -> Result<Self, AuthzError> {
        if !raw.starts_with('/') {
            return Err(AuthzError::pattern(raw, "must start with `/`"));
        }

        let mut names = HashSet::new();
        let mut segments = Vec::new();
        for (i, part) in raw.split('/').enumerate() {
            if i == 0 {
                segments.push(Segment::Literal(String::new()));
                continue;
            }
            if part.is_empty() && raw != "/" {
                return Err(AuthzError::pattern(raw, "contains an empty segment"));
            }
            match part.strip_prefix(':') {
                Some("") => return Err(AuthzError::pattern(raw, "parameter without a name")),
                Some(name) => {
                    if !names.insert(name) {
                        return Err(AuthzError::pattern(
                            raw,
                            format!("parameter `:{name}` appears twice"),
                        ));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn has_params(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    /// Number of `/`-separated segments, counting the leading empty one.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Match `path` segment by segment, returning the parameter bindings.
    pub fn match_segments<'p>(&self, path: &'p str) -> Option<Vec<(String, &'p str)>> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            if !segment.matches(part) {
                return None;
            }
            if let Segment::Param(name) = segment {
                params.push((name.clone(), *part));
            }
        }
        Some(params)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for RoutePattern {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoutePattern {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoutePattern> for String {
    fn from(pattern: RoutePattern) -> Self {
        pattern.raw
    }
}

fn default_require_auth() -> bool {
    true
}

/// Access rule for one route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    #[serde(rename = "path")]
    pub pattern: RoutePattern,
    #[serde(default = "default_require_auth")]
    pub require_auth: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl RouteConfig {
    /// A rule requiring authentication and nothing else.
    pub fn new(pattern: &str) -> Result<Self, AuthzError> {
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            require_auth: true,
            permissions: Vec::new(),
            roles: Vec::new(),
            redirect_to: None,
        })
    }

    /// A rule open to everyone.
    pub fn public(pattern: &str) -> Result<Self, AuthzError> {
        Ok(Self {
            require_auth: false,
            ..Self::new(pattern)?
        })
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn with_permissions(
        mut self,
        permissions: impl IntoIterator<Item = PermissionKey>,
    ) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect_to = Some(target.into());
        self
    }

    fn redirect_target(&self) -> String {
        self.redirect_to
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT.to_string())
    }
}

/// A matched rule and the parameters bound by its pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'t, 'p> {
    pub config: &'t RouteConfig,
    pub params: Vec<(String, &'p str)>,
}

impl<'t, 'p> RouteMatch<'t, 'p> {
    pub fn param(&self, name: &str) -> Option<&'p str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| *value)
    }
}

/// Declaration-ordered route rules. Never mutated by matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: Vec<RouteConfig>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the rule governing `path`: exact key first, then the first
    /// segment-wise match in declaration order.
    pub fn match_path<'t, 'p>(&'t self, path: &'p str) -> Option<RouteMatch<'t, 'p>> {
        if let Some(config) = self.routes.iter().find(|r| r.pattern.as_str() == path) {
            let params = config.pattern.match_segments(path).unwrap_or_default();
            return Some(RouteMatch { config, params });
        }

        self.routes.iter().find_map(|config| {
            config
                .pattern
                .match_segments(path)
                .map(|params| RouteMatch { config, params })
        })
    }

    /// Reject duplicate patterns.
    pub fn validate(&self) -> Result<(), AuthzError> {
        let mut seen = HashSet::new();
        for route in &self.routes {
            if !seen.insert(route.pattern.as_str()) {
                return Err(AuthzError::DuplicateRoute(route.pattern.to_string()));
            }
        }
        Ok(())
    }
}

impl From<Vec<RouteConfig>> for RouteTable {
    fn from(routes: Vec<RouteConfig>) -> Self {
        Self { routes }
    }
}

/// What to do with a path no rule matches.
///
/// `Allow` keeps unregistered pages (marketing, browsing) reachable; any
/// protected page must then be registered explicitly. `Deny` closes them and
/// redirects to [`DEFAULT_REDIRECT`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedRoutePolicy {
    #[default]
    Allow,
    Deny,
}

/// Why a route was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    RoleNotAllowed { role: Role },
    MissingPermission { permission: PermissionKey },
    Unmatched,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleNotAllowed { role } => write!(f, "role `{role}` is not allowed"),
            Self::MissingPermission { permission } => {
                write!(f, "missing permission `{permission}`")
            }
            Self::Unmatched => f.write_str("no route configuration matches"),
        }
    }
}

/// Result of a route check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub can_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
}

impl RouteDecision {
    pub fn allow() -> Self {
        Self {
            can_access: true,
            redirect_to: None,
            reason: None,
        }
    }

    pub fn deny(redirect_to: impl Into<String>, reason: DenyReason) -> Self {
        Self {
            can_access: false,
            redirect_to: Some(redirect_to.into()),
            reason: Some(reason),
        }
    }
}

/// Decide whether `role` may open `path`.
///
/// `expand` turns the role into its permission list; it is only called when
/// the matched rule declares required permissions. Those are checked without
/// ownership context, and all of them must pass.
pub fn can_access_route<F>(
    table: &RouteTable,
    unmatched: UnmatchedRoutePolicy,
    path: &str,
    role: Role,
    expand: F,
) -> RouteDecision
where
    F: FnOnce(Role) -> Vec<Permission>,
{
    let Some(matched) = table.match_path(path) else {
        return match unmatched {
            UnmatchedRoutePolicy::Allow => RouteDecision::allow(),
            UnmatchedRoutePolicy::Deny => {
                debug!(path, %role, "Route denied: unmatched path");
                RouteDecision::deny(DEFAULT_REDIRECT, DenyReason::Unmatched)
            }
        };
    };
    let config = matched.config;

    if !config.require_auth {
        return RouteDecision::allow();
    }

    if !config.roles.is_empty() && !config.roles.contains(&role) {
        debug!(path, pattern = %config.pattern, %role, "Route denied: role not allowed");
        return RouteDecision::deny(config.redirect_target(), DenyReason::RoleNotAllowed { role });
    }

    if !config.permissions.is_empty() {
        let permissions = expand(role);
        let missing = config.permissions.iter().find(|key| {
            !has_permission(&permissions, key.resource, key.action, Ownership::unscoped())
        });
        if let Some(&permission) = missing {
            debug!(
                path,
                pattern = %config.pattern,
                %role,
                %permission,
                "Route denied: missing permission"
            );
            return RouteDecision::deny(
                config.redirect_target(),
                DenyReason::MissingPermission { permission },
            );
        }
    }

    RouteDecision::allow()
}
