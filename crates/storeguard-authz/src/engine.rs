//! Authorizer: a validated policy with its permission catalog.

use crate::access::AccessLevel;
use crate::audit::{AuditKind, AuditSink, AuthzAuditEvent};
use crate::catalog::PermissionCatalog;
use crate::defaults;
use crate::error::{AuthzError, Result};
use crate::identity::{access_level_for, ActingIdentity};
use crate::route::{self, RouteDecision, RouteTable, UnmatchedRoutePolicy};
use crate::types::{Action, Permission, Resource, Role, RoleTable};
use tracing::debug;

/// Immutable authorization policy.
///
/// Built once from an injected role table and route table. Construction
/// validates both and builds the permission catalog; afterwards every method
/// is a pure read, so one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct Authorizer {
    roles: RoleTable,
    routes: RouteTable,
    unmatched: UnmatchedRoutePolicy,
    catalog: PermissionCatalog,
}

impl Authorizer {
    pub fn new(
        roles: RoleTable,
        routes: RouteTable,
        unmatched: UnmatchedRoutePolicy,
    ) -> Result<Self> {
        roles.validate()?;
        routes.validate()?;

        for route in routes.routes() {
            if let Some(&role) = route.roles.iter().find(|&&r| !roles.contains(r)) {
                return Err(AuthzError::UndefinedRole {
                    route: route.pattern.to_string(),
                    role,
                });
            }
        }

        let catalog = PermissionCatalog::build(&roles);
        debug!(
            roles = roles.len(),
            routes = routes.len(),
            permissions = catalog.len(),
            unmatched = ?unmatched,
            "Authorizer ready"
        );

        Ok(Self {
            roles,
            routes,
            unmatched,
            catalog,
        })
    }

    /// The built-in storefront policy.
    pub fn storefront() -> Result<Self> {
        Self::new(
            defaults::storefront_role_table(),
            defaults::storefront_routes()?,
            UnmatchedRoutePolicy::default(),
        )
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    pub fn role_table(&self) -> &RoleTable {
        &self.roles
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.routes
    }

    pub fn unmatched_policy(&self) -> UnmatchedRoutePolicy {
        self.unmatched
    }

    /// Flattened permissions of `role`.
    pub fn permissions_of(&self, role: Role) -> Vec<Permission> {
        self.catalog.permissions_for(&self.roles, role)
    }

    /// An identity holding `role`'s permissions.
    pub fn identity(&self, id: impl Into<String>, role: Role) -> ActingIdentity {
        ActingIdentity::for_role(id, role, &self.catalog, &self.roles)
    }

    pub fn has_permission(
        &self,
        identity: &ActingIdentity,
        resource: Resource,
        action: Action,
        resource_owner_id: Option<&str>,
    ) -> bool {
        identity.can(resource, action, resource_owner_id)
    }

    /// Access level for `identity`; `Hidden` when there is none.
    pub fn access_level(
        &self,
        identity: Option<&ActingIdentity>,
        resource: Resource,
        action: Action,
        resource_owner_id: Option<&str>,
    ) -> AccessLevel {
        access_level_for(identity, resource, action, resource_owner_id)
    }

    pub fn can_access_route(&self, path: &str, role: Role) -> RouteDecision {
        route::can_access_route(&self.routes, self.unmatched, path, role, |role| {
            self.permissions_of(role)
        })
    }

    /// Permission check that reports the decision to `sink`.
    ///
    /// `actor_id` is the real operator; it differs from `identity.id` while
    /// impersonating.
    pub fn authorize(
        &self,
        actor_id: &str,
        identity: &ActingIdentity,
        resource: Resource,
        action: Action,
        resource_owner_id: Option<&str>,
        sink: &dyn AuditSink,
    ) -> bool {
        let granted = identity.can(resource, action, resource_owner_id);
        sink.record(
            AuthzAuditEvent::new(
                actor_id,
                AuditKind::PermissionCheck {
                    resource,
                    action,
                    resource_owner_id: resource_owner_id.map(String::from),
                    granted,
                },
            )
            .on_behalf_of(identity.id.as_str()),
        );
        granted
    }

    /// Route check that reports the decision to `sink`.
    pub fn authorize_route(
        &self,
        actor_id: &str,
        identity: &ActingIdentity,
        path: &str,
        sink: &dyn AuditSink,
    ) -> RouteDecision {
        let decision = self.can_access_route(path, identity.role);
        sink.record(
            AuthzAuditEvent::new(
                actor_id,
                AuditKind::RouteCheck {
                    path: path.to_string(),
                    granted: decision.can_access,
                    reason: decision.reason.as_ref().map(ToString::to_string),
                },
            )
            .on_behalf_of(identity.id.as_str()),
        );
        decision
    }
}
