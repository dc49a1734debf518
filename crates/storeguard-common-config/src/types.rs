//! Policy file types.

use serde::{Deserialize, Serialize};
use storeguard_authz::{
    defaults, Authorizer, AuthzError, RoleTable, RouteTable, UnmatchedRoutePolicy,
};

/// Root of a policy file.
///
/// Every section is optional; omitted roles or routes fall back to the
/// built-in storefront policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Decision for paths no route rule matches.
    pub unmatched_routes: UnmatchedRoutePolicy,
    /// Role table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<RoleTable>,
    /// Route rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<RouteTable>,
}

impl PolicyConfig {
    /// The built-in policy with every section spelled out.
    pub fn storefront() -> Result<Self, AuthzError> {
        Ok(Self {
            unmatched_routes: UnmatchedRoutePolicy::default(),
            roles: Some(defaults::storefront_role_table()),
            routes: Some(defaults::storefront_routes()?),
        })
    }

    /// True when neither roles nor routes are overridden.
    pub fn is_builtin(&self) -> bool {
        self.roles.is_none() && self.routes.is_none()
    }

    /// Configured role table, or the built-in one.
    pub fn role_table(&self) -> RoleTable {
        self.roles
            .clone()
            .unwrap_or_else(defaults::storefront_role_table)
    }

    /// Configured route table, or the built-in one.
    pub fn route_table(&self) -> Result<RouteTable, AuthzError> {
        match &self.routes {
            Some(routes) => Ok(routes.clone()),
            None => defaults::storefront_routes(),
        }
    }

    /// Validate the policy and build its authorizer.
    pub fn build(&self) -> Result<Authorizer, AuthzError> {
        Authorizer::new(self.role_table(), self.route_table()?, self.unmatched_routes)
    }
}
