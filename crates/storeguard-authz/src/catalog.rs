//! Permission catalog derived from a role table.

use crate::types::{describe, Permission, PermissionKey, Role, RoleTable};
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Derive the deduplicated permission list for `table`.
///
/// Roles and grants are walked in declaration order. The first occurrence of
/// each `resource:action` pair gets the next id (starting at 1); later
/// occurrences are skipped. `manage` is kept as a literal action. Every
/// record of one build shares the same `created_at`.
///
/// Ids are only meaningful within one build: reordering the table renumbers
/// them. Compare permissions by key, not by id.
pub fn build_catalog(table: &RoleTable) -> Vec<Permission> {
    let created_at = Utc::now();
    let mut seen = HashSet::new();
    let mut permissions = Vec::new();

    for definition in table.definitions() {
        for grant in &definition.grants {
            for key in grant.keys() {
                if !seen.insert(key) {
                    continue;
                }
                permissions.push(Permission {
                    id: permissions.len() as u32 + 1,
                    resource: key.resource,
                    action: key.action,
                    description: describe(key.resource, key.action),
                    is_system: true,
                    created_at,
                });
            }
        }
    }

    tracing::debug!(
        roles = table.len(),
        permissions = permissions.len(),
        "Built permission catalog"
    );
    permissions
}

/// A built catalog with lookup by key.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PermissionCatalog {
    permissions: Vec<Permission>,
    #[serde(skip)]
    index: HashMap<PermissionKey, usize>,
}

impl PermissionCatalog {
    pub fn build(table: &RoleTable) -> Self {
        let permissions = build_catalog(table);
        let index = permissions
            .iter()
            .enumerate()
            .map(|(i, p)| (p.key(), i))
            .collect();
        Self { permissions, index }
    }

    pub fn get(&self, key: &PermissionKey) -> Option<&Permission> {
        self.index.get(key).map(|&i| &self.permissions[i])
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    pub fn as_slice(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Flatten `role`'s grants into catalog records.
    ///
    /// A role with no definition expands to nothing. Each key appears once.
    pub fn permissions_for(&self, table: &RoleTable, role: Role) -> Vec<Permission> {
        let Some(grants) = table.grants(role) else {
            return Vec::new();
        };

        let mut out: Vec<Permission> = Vec::new();
        for key in grants.iter().flat_map(|g| g.keys()) {
            if out.iter().any(|p| p.key() == key) {
                continue;
            }
            match self.get(&key) {
                Some(permission) => out.push(permission.clone()),
                // The table was not the one this catalog was built from.
                None => out.push(Permission::from(key)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Grant, Resource};

    fn table() -> RoleTable {
        RoleTable::new()
            .with_role(
                Role::Admin,
                [
                    Grant::manage(Resource::Products),
                    Grant::new(Resource::Orders, [Action::Read, Action::Update]),
                ],
            )
            .with_role(
                Role::Seller,
                [
                    Grant::new(
                        Resource::Products,
                        [Action::Create, Action::Read, Action::Update, Action::Delete],
                    )
                    .own(),
                    Grant::new(Resource::Orders, [Action::Read]).own(),
                ],
            )
            .with_role(Role::Guest, [Grant::new(Resource::Products, [Action::Read])])
    }

    #[test]
    fn test_one_permission_per_distinct_key() {
        let catalog = build_catalog(&table());
        let keys: Vec<String> = catalog.iter().map(|p| p.key().to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "products:manage",
                "orders:read",
                "orders:update",
                "products:create",
                "products:read",
                "products:update",
                "products:delete",
            ]
        );
    }

    #[test]
    fn test_ids_are_sequential_and_not_renumbered() {
        let catalog = build_catalog(&table());
        let ids: Vec<u32> = catalog.iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_records_share_timestamp_and_system_flag() {
        let catalog = build_catalog(&table());
        let first = catalog[0].created_at;
        assert!(catalog.iter().all(|p| p.created_at == first));
        assert!(catalog.iter().all(|p| p.is_system));
        assert_eq!(catalog[1].description, "Permission to read orders");
    }

    #[test]
    fn test_manage_is_not_expanded() {
        let table = RoleTable::new().with_role(Role::Admin, [Grant::manage(Resource::Users)]);
        let catalog = build_catalog(&table);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].action, Action::Manage);
    }

    #[test]
    fn test_empty_table_builds_empty_catalog() {
        assert!(build_catalog(&RoleTable::new()).is_empty());
    }

    #[test]
    fn test_rebuild_yields_same_key_set() {
        let first: HashSet<_> = build_catalog(&table()).into_iter().collect();
        let second: HashSet<_> = build_catalog(&table()).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = PermissionCatalog::build(&table());
        let key = PermissionKey::new(Resource::Orders, Action::Update);
        assert_eq!(catalog.get(&key).map(|p| p.id), Some(3));
        assert!(!catalog.contains(&PermissionKey::new(Resource::Users, Action::Read)));
        assert_eq!(catalog.len(), 7);
    }

    #[test]
    fn test_permissions_for_role() {
        let table = table();
        let catalog = PermissionCatalog::build(&table);

        let seller = catalog.permissions_for(&table, Role::Seller);
        assert_eq!(seller.len(), 5);
        assert!(seller.iter().all(|p| p.is_system));
        assert!(seller
            .iter()
            .any(|p| p.key() == PermissionKey::new(Resource::Orders, Action::Read)));

        assert!(catalog.permissions_for(&table, Role::Support).is_empty());
    }

    #[test]
    fn test_permissions_for_foreign_table_detaches_unknown_keys() {
        let catalog = PermissionCatalog::build(&table());
        let other = RoleTable::new()
            .with_role(Role::Support, [Grant::new(Resource::Users, [Action::Read])]);
        let perms = catalog.permissions_for(&other, Role::Support);
        assert_eq!(perms.len(), 1);
        assert_eq!(perms[0].id, 0);
        assert!(!perms[0].is_system);
    }
}
