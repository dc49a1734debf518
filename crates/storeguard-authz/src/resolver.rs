//! Permission resolution.

use crate::types::{Action, Permission, Resource};

/// Ownership context for a scoped check.
///
/// Scoping applies only when both ids are present; otherwise the check is
/// unscoped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ownership<'a> {
    pub resource_owner_id: Option<&'a str>,
    pub acting_id: Option<&'a str>,
}

impl<'a> Ownership<'a> {
    pub fn new(resource_owner_id: Option<&'a str>, acting_id: Option<&'a str>) -> Self {
        Self {
            resource_owner_id,
            acting_id,
        }
    }

    /// No ownership context.
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Check against an object owned by `owner` on behalf of `actor`.
    pub fn scoped(owner: &'a str, actor: &'a str) -> Self {
        Self::new(Some(owner), Some(actor))
    }

    /// `None` when scoping does not apply, otherwise whether the ids match.
    fn matches(&self) -> Option<bool> {
        match (self.resource_owner_id, self.acting_id) {
            (Some(owner), Some(actor)) => Some(owner == actor),
            _ => None,
        }
    }
}

/// Decide whether `permissions` allow `action` on `resource`.
///
/// 1. `manage` on the resource allows every action, ownership included.
/// 2. Otherwise an exact `resource:action` entry is required.
/// 3. With both ownership ids present, the owner must be the actor.
pub fn has_permission(
    permissions: &[Permission],
    resource: Resource,
    action: Action,
    ownership: Ownership<'_>,
) -> bool {
    if permissions
        .iter()
        .any(|p| p.resource == resource && p.action == Action::Manage)
    {
        return true;
    }

    let granted = permissions
        .iter()
        .any(|p| p.resource == resource && p.action == action);
    if !granted {
        return false;
    }

    ownership.matches().unwrap_or(true)
}
