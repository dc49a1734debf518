//! Authorization types: resources, actions, roles, grants and permissions.

use crate::error::AuthzError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Declares a closed set of named values with a stable textual form.
macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        pub enum $name:ident / $err:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable textual form used in keys, policy files and logs.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AuthzError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(AuthzError::$err(s.to_string())),
                }
            }
        }
    };
}

closed_set! {
    /// Protected classes of domain objects.
    pub enum Resource / UnknownResource {
        Users => "users",
        Products => "products",
        Orders => "orders",
        Settings => "settings",
        AuditLogs => "audit_logs",
        ScheduledJobs => "scheduled_jobs",
        Categories => "categories",
        Sellers => "sellers",
        Payments => "payments",
        Reviews => "reviews",
        Inventory => "inventory",
        Roles => "roles",
        Reports => "reports",
        Banners => "banners",
        Videos => "videos",
    }
}

closed_set! {
    /// Operations that can be performed on a resource.
    pub enum Action / UnknownAction {
        Create => "create",
        Read => "read",
        Update => "update",
        Delete => "delete",
        /// Wildcard: satisfies every action on the resource.
        Manage => "manage",
        Approve => "approve",
        Reject => "reject",
        Export => "export",
        Import => "import",
    }
}

closed_set! {
    /// Predefined roles.
    ///
    /// They are conventionally ordered by capability
    /// (super admin ⊇ admin ⊇ manager/seller/content editor/support ⊇ user ⊇ guest),
    /// but nothing is inherited: each role lists its grants explicitly.
    pub enum Role / UnknownRole {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Manager => "manager",
        Seller => "seller",
        ContentEditor => "content_editor",
        Support => "support",
        User => "user",
        Guest => "guest",
    }
}

/// Restricts a grant to object instances owned by the acting identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Own,
}

/// A role's grant of a list of actions on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub resource: Resource,
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl Grant {
    pub fn new(resource: Resource, actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            resource,
            actions: actions.into_iter().collect(),
            scope: None,
        }
    }

    /// Grant `manage` on the resource.
    pub fn manage(resource: Resource) -> Self {
        Self::new(resource, [Action::Manage])
    }

    /// Restrict this grant to owned instances.
    pub fn own(mut self) -> Self {
        self.scope = Some(Scope::Own);
        self
    }

    pub fn is_owned_only(&self) -> bool {
        self.scope == Some(Scope::Own)
    }

    /// Permission keys covered by this grant, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = PermissionKey> + '_ {
        self.actions
            .iter()
            .map(move |&action| PermissionKey::new(self.resource, action))
    }
}

/// One role and its grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub role: Role,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

/// Declaration-ordered mapping from role to grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTable {
    definitions: Vec<RoleDefinition>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition.
    pub fn with_role(mut self, role: Role, grants: impl IntoIterator<Item = Grant>) -> Self {
        self.definitions.push(RoleDefinition {
            role,
            grants: grants.into_iter().collect(),
        });
        self
    }

    pub fn definitions(&self) -> &[RoleDefinition] {
        &self.definitions
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.definitions.iter().map(|d| d.role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.definitions.iter().any(|d| d.role == role)
    }

    /// Grants of `role`, or `None` if the role is not defined.
    pub fn grants(&self, role: Role) -> Option<&[Grant]> {
        self.definitions
            .iter()
            .find(|d| d.role == role)
            .map(|d| d.grants.as_slice())
    }

    /// Keys `role` holds only through owner-scoped grants.
    ///
    /// A key that any unscoped grant of the role also covers is not listed.
    pub fn owned_only_keys(&self, role: Role) -> BTreeSet<PermissionKey> {
        let Some(grants) = self.grants(role) else {
            return BTreeSet::new();
        };
        let (owned, open): (Vec<&Grant>, Vec<&Grant>) =
            grants.iter().partition(|g| g.is_owned_only());
        let open: HashSet<PermissionKey> = open.iter().flat_map(|g| g.keys()).collect();

        owned
            .iter()
            .flat_map(|g| g.keys())
            .filter(|key| !open.contains(key))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Reject tables that define a role twice.
    pub fn validate(&self) -> Result<(), AuthzError> {
        let mut seen = HashSet::new();
        for definition in &self.definitions {
            if !seen.insert(definition.role) {
                return Err(AuthzError::DuplicateRole(definition.role));
            }
        }
        Ok(())
    }
}

impl From<Vec<RoleDefinition>> for RoleTable {
    fn from(definitions: Vec<RoleDefinition>) -> Self {
        Self { definitions }
    }
}

/// Structural identity of a permission: `resource:action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey {
    pub resource: Resource,
    pub action: Action,
}

impl PermissionKey {
    pub fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for PermissionKey {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| AuthzError::InvalidPermissionKey(s.to_string()))?;
        Ok(Self::new(resource.parse()?, action.parse()?))
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermissionKey> for String {
    fn from(key: PermissionKey) -> Self {
        key.to_string()
    }
}

/// A materialized permission record.
///
/// Equality and hashing only consider `resource` and `action`; `id` and
/// `created_at` depend on the build that produced the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: u32,
    pub resource: Resource,
    pub action: Action,
    pub description: String,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// A permission that was not issued by a catalog build.
    ///
    /// Identity providers use this for records loaded from a backend store.
    pub fn detached(resource: Resource, action: Action) -> Self {
        Self {
            id: 0,
            resource,
            action,
            description: describe(resource, action),
            is_system: false,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.resource, self.action)
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Permission {}

impl Hash for Permission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<PermissionKey> for Permission {
    fn from(key: PermissionKey) -> Self {
        Self::detached(key.resource, key.action)
    }
}

pub(crate) fn describe(resource: Resource, action: Action) -> String {
    format!("Permission to {action} {resource}")
}
