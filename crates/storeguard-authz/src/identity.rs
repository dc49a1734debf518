//! Acting identities and the impersonation override.
//!
//! Decision functions never look up a "current user": callers pass the
//! effective identity explicitly. [`IdentityContext`] is the piece that owns
//! the real operator and an optional impersonated identity, and hands out a
//! consistent snapshot of whichever one is in effect.

use crate::access::AccessLevel;
use crate::audit::{AuditKind, AuditSink, AuthzAuditEvent};
use crate::catalog::PermissionCatalog;
use crate::resolver::{has_permission, Ownership};
use crate::types::{Action, Permission, PermissionKey, Resource, Role, RoleTable};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// The principal a decision is made for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActingIdentity {
    pub id: String,
    pub role: Role,
    /// Permissions already flattened from the role.
    pub permissions: Vec<Permission>,
    /// Keys that only apply to objects this identity owns.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub owned_only: BTreeSet<PermissionKey>,
}

impl ActingIdentity {
    /// An identity whose permissions are all unscoped.
    pub fn new(id: impl Into<String>, role: Role, permissions: Vec<Permission>) -> Self {
        Self {
            id: id.into(),
            role,
            permissions,
            owned_only: BTreeSet::new(),
        }
    }

    /// An identity holding the permissions `table` grants to `role`.
    ///
    /// Keys the role only holds through `scope: own` grants are checked
    /// against the object owner.
    pub fn for_role(
        id: impl Into<String>,
        role: Role,
        catalog: &PermissionCatalog,
        table: &RoleTable,
    ) -> Self {
        Self::new(id, role, catalog.permissions_for(table, role))
            .with_owned_only(table.owned_only_keys(role))
    }

    /// Restrict `keys` to owned objects.
    pub fn with_owned_only(mut self, keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        self.owned_only.extend(keys);
        self
    }

    fn ownership<'a>(
        &'a self,
        resource: Resource,
        action: Action,
        resource_owner_id: Option<&'a str>,
    ) -> Ownership<'a> {
        if self.owned_only.contains(&PermissionKey::new(resource, action)) {
            Ownership::new(resource_owner_id, Some(self.id.as_str()))
        } else {
            Ownership::unscoped()
        }
    }

    /// Check `action` on `resource` owned by `resource_owner_id`.
    ///
    /// The owner only matters for keys in [`owned_only`](Self::owned_only).
    pub fn can(&self, resource: Resource, action: Action, resource_owner_id: Option<&str>) -> bool {
        has_permission(
            &self.permissions,
            resource,
            action,
            self.ownership(resource, action, resource_owner_id),
        )
    }

    /// Same tiers as [`get_access_level`], with the owner applied per key.
    ///
    /// [`get_access_level`]: crate::access::get_access_level
    pub fn access_level(
        &self,
        resource: Resource,
        action: Action,
        resource_owner_id: Option<&str>,
    ) -> AccessLevel {
        if self.can(resource, action, resource_owner_id) {
            AccessLevel::Full
        } else if self.can(resource, Action::Read, resource_owner_id) {
            AccessLevel::ReadOnly
        } else {
            AccessLevel::Hidden
        }
    }
}

/// Access level for a possibly absent identity.
///
/// No identity means `Hidden`, without consulting any permission.
pub fn access_level_for(
    identity: Option<&ActingIdentity>,
    resource: Resource,
    action: Action,
    resource_owner_id: Option<&str>,
) -> AccessLevel {
    match identity {
        Some(identity) => identity.access_level(resource, action, resource_owner_id),
        None => AccessLevel::Hidden,
    }
}

#[derive(Debug)]
struct ContextState {
    real: Arc<ActingIdentity>,
    impersonated: Option<Arc<ActingIdentity>>,
}

/// Real identity plus an optional impersonation override.
///
/// Both live behind one lock, so [`effective`](Self::effective) always
/// returns either the real or the impersonated identity in full.
pub struct IdentityContext {
    state: RwLock<ContextState>,
    audit: Arc<dyn AuditSink>,
}

impl IdentityContext {
    pub fn new(real: ActingIdentity, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            state: RwLock::new(ContextState {
                real: Arc::new(real),
                impersonated: None,
            }),
            audit,
        }
    }

    /// The identity decisions should be made for.
    pub fn effective(&self) -> Arc<ActingIdentity> {
        let state = self.state.read();
        state
            .impersonated
            .clone()
            .unwrap_or_else(|| state.real.clone())
    }

    /// The operator behind the session.
    pub fn real(&self) -> Arc<ActingIdentity> {
        self.state.read().real.clone()
    }

    pub fn is_impersonating(&self) -> bool {
        self.state.read().impersonated.is_some()
    }

    /// Replace the real identity (login, token refresh). Impersonation is kept.
    pub fn refresh(&self, real: ActingIdentity) {
        self.state.write().real = Arc::new(real);
    }

    /// Start acting as `target`. Returns the identity previously impersonated.
    pub fn start_impersonation(&self, target: ActingIdentity) -> Option<Arc<ActingIdentity>> {
        let target = Arc::new(target);
        let (actor_id, previous) = {
            let mut state = self.state.write();
            let previous = state.impersonated.replace(target.clone());
            (state.real.id.clone(), previous)
        };

        info!(actor_id = %actor_id, target_id = %target.id, "Impersonation started");
        self.audit.record(
            AuthzAuditEvent::new(
                actor_id,
                AuditKind::ImpersonationStarted {
                    target_id: target.id.clone(),
                },
            )
            .on_behalf_of(target.id.clone()),
        );
        previous
    }

    /// Return to the real identity. Returns the identity that was impersonated.
    pub fn stop_impersonation(&self) -> Option<Arc<ActingIdentity>> {
        let (actor_id, previous) = {
            let mut state = self.state.write();
            (state.real.id.clone(), state.impersonated.take())
        };

        if let Some(target) = &previous {
            info!(actor_id = %actor_id, target_id = %target.id, "Impersonation stopped");
            self.audit.record(AuthzAuditEvent::new(
                actor_id,
                AuditKind::ImpersonationStopped {
                    target_id: target.id.clone(),
                },
            ));
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::types::Grant;

    fn operator() -> ActingIdentity {
        ActingIdentity::new(
            "op-1",
            Role::Admin,
            vec![Permission::detached(Resource::Users, Action::Manage)],
        )
    }

    fn seller(id: &str) -> ActingIdentity {
        ActingIdentity::new(
            id,
            Role::Seller,
            vec![
                Permission::detached(Resource::Products, Action::Read),
                Permission::detached(Resource::Products, Action::Update),
                Permission::detached(Resource::Reviews, Action::Read),
            ],
        )
        .with_owned_only([PermissionKey::new(Resource::Products, Action::Update)])
    }

    #[test]
    fn test_for_role_uses_catalog_records() {
        let table = RoleTable::new()
            .with_role(Role::Guest, [Grant::new(Resource::Products, [Action::Read])]);
        let catalog = PermissionCatalog::build(&table);

        let guest = ActingIdentity::for_role("g1", Role::Guest, &catalog, &table);
        assert_eq!(guest.permissions.len(), 1);
        assert_eq!(guest.permissions[0].id, 1);

        let nobody = ActingIdentity::for_role("x", Role::Admin, &catalog, &table);
        assert!(nobody.permissions.is_empty());
    }

    #[test]
    fn test_identity_scopes_owned_keys_to_itself() {
        let s = seller("s1");
        assert!(s.can(Resource::Products, Action::Update, Some("s1")));
        assert!(!s.can(Resource::Products, Action::Update, Some("s2")));
        assert!(s.can(Resource::Products, Action::Update, None));
        assert_eq!(
            s.access_level(Resource::Products, Action::Delete, None),
            AccessLevel::ReadOnly
        );
    }

    #[test]
    fn test_unscoped_keys_ignore_owner() {
        let s = seller("s1");
        assert!(s.can(Resource::Products, Action::Read, Some("s2")));
        assert!(s.can(Resource::Reviews, Action::Read, Some("u-9")));
        assert_eq!(
            s.access_level(Resource::Products, Action::Update, Some("s2")),
            AccessLevel::ReadOnly
        );
    }

    #[test]
    fn test_for_role_marks_owned_grants() {
        let table = RoleTable::new().with_role(
            Role::User,
            [
                Grant::new(Resource::Reviews, [Action::Create, Action::Read]),
                Grant::new(Resource::Reviews, [Action::Update]).own(),
            ],
        );
        let catalog = PermissionCatalog::build(&table);
        let user = ActingIdentity::for_role("u1", Role::User, &catalog, &table);

        assert!(user.can(Resource::Reviews, Action::Read, Some("u2")));
        assert!(!user.can(Resource::Reviews, Action::Update, Some("u2")));
        assert!(user.can(Resource::Reviews, Action::Update, Some("u1")));
    }

    #[test]
    fn test_absent_identity_is_hidden() {
        assert_eq!(
            access_level_for(None, Resource::Products, Action::Read, None),
            AccessLevel::Hidden
        );
        let s = seller("s1");
        assert_eq!(
            access_level_for(Some(&s), Resource::Products, Action::Read, None),
            AccessLevel::Full
        );
    }

    #[test]
    fn test_impersonation_swaps_effective_identity() {
        let sink = Arc::new(MemoryAuditSink::new());
        let ctx = IdentityContext::new(operator(), sink.clone());
        assert_eq!(ctx.effective().id, "op-1");
        assert!(!ctx.is_impersonating());

        assert!(ctx.start_impersonation(seller("s1")).is_none());
        assert!(ctx.is_impersonating());
        assert_eq!(ctx.effective().id, "s1");
        assert_eq!(ctx.real().id, "op-1");

        let previous = ctx.start_impersonation(seller("s2")).unwrap();
        assert_eq!(previous.id, "s1");

        let stopped = ctx.stop_impersonation().unwrap();
        assert_eq!(stopped.id, "s2");
        assert_eq!(ctx.effective().id, "op-1");
        assert!(ctx.stop_impersonation().is_none());

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.actor_id == "op-1"));
        assert_eq!(
            events[2].kind,
            AuditKind::ImpersonationStopped { target_id: "s2".into() }
        );
    }

    #[test]
    fn test_refresh_keeps_impersonation() {
        let ctx = IdentityContext::new(operator(), Arc::new(MemoryAuditSink::new()));
        ctx.start_impersonation(seller("s1"));
        ctx.refresh(ActingIdentity::new("op-1", Role::SuperAdmin, Vec::new()));
        assert_eq!(ctx.real().role, Role::SuperAdmin);
        assert_eq!(ctx.effective().id, "s1");
    }

    #[test]
    fn test_snapshots_are_consistent_across_threads() {
        let ctx = Arc::new(IdentityContext::new(operator(), Arc::new(MemoryAuditSink::new())));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let identity = ctx.effective();
                        match identity.id.as_str() {
                            "op-1" => assert_eq!(identity.role, Role::Admin),
                            "s1" => assert_eq!(identity.role, Role::Seller),
                            other => panic!("unexpected identity {other}"),
                        }
                    }
                })
            })
            .collect();

        for _ in 0..200 {
            ctx.start_impersonation(seller("s1"));
            ctx.stop_impersonation();
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
