//! Authorization core for the Storeguard storefront.
//!
//! The model is resource/action/role based:
//!
//! - a [`RoleTable`] grants actions on resources to roles, optionally scoped
//!   to owned instances;
//! - [`build_catalog`] derives the deduplicated [`Permission`] universe;
//! - [`has_permission`] resolves a check against a flattened permission list,
//!   treating `manage` as a wildcard;
//! - [`get_access_level`] maps a check onto a UI [`AccessLevel`];
//! - [`can_access_route`] guards paths by role and permission.
//!
//! [`Authorizer`] bundles a validated role table and route table. All
//! decisions are pure; the only mutable state is the impersonation override
//! in [`IdentityContext`].

pub mod access;
pub mod audit;
pub mod catalog;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod identity;
pub mod resolver;
pub mod route;
pub mod types;

pub use access::{get_access_level, read_access_level, AccessLevel};
pub use audit::{AuditKind, AuditSink, AuthzAuditEvent, MemoryAuditSink, TracingAuditSink};
pub use catalog::{build_catalog, PermissionCatalog};
pub use engine::Authorizer;
pub use error::{AuthzError, Result};
pub use identity::{access_level_for, ActingIdentity, IdentityContext};
pub use resolver::{has_permission, Ownership};
pub use route::{
    can_access_route, DenyReason, RouteConfig, RouteDecision, RouteMatch, RoutePattern,
    RouteTable, UnmatchedRoutePolicy, DEFAULT_REDIRECT,
};
pub use types::{
    Action, Grant, Permission, PermissionKey, Resource, Role, RoleDefinition, RoleTable, Scope,
};
