//! UI-facing access levels.

use crate::resolver::{has_permission, Ownership};
use crate::types::{Action, Permission, Resource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an access check for a UI element.
///
/// These are four discrete states, not a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Do not render or allow.
    Hidden,
    /// Render but block interaction. Only ever chosen by the caller.
    Disabled,
    /// Render in a non-mutating mode.
    ReadOnly,
    /// Unrestricted.
    Full,
}

impl AccessLevel {
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }

    pub fn can_interact(self) -> bool {
        matches!(self, Self::ReadOnly | Self::Full)
    }

    pub fn can_mutate(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Keep a visible control inert unless access is `Full`.
    ///
    /// `Hidden` stays hidden.
    pub fn disabled_unless_full(self) -> Self {
        match self {
            Self::Full => Self::Full,
            Self::Hidden => Self::Hidden,
            Self::Disabled | Self::ReadOnly => Self::Disabled,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Disabled => "disabled",
            Self::ReadOnly => "read_only",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the access level for `required_action` on `resource`.
///
/// `Full` when the requested action is allowed, otherwise `ReadOnly` when
/// `read` is allowed, otherwise `Hidden`. Both checks use the same ownership
/// context. Never returns `Disabled`.
///
/// An unauthenticated caller should short-circuit to `Hidden` before calling
/// this (see [`access_level_for`]); an empty list resolves to `Hidden` anyway.
///
/// [`access_level_for`]: crate::identity::access_level_for
pub fn get_access_level(
    permissions: &[Permission],
    resource: Resource,
    required_action: Action,
    ownership: Ownership<'_>,
) -> AccessLevel {
    if has_permission(permissions, resource, required_action, ownership) {
        AccessLevel::Full
    } else if has_permission(permissions, resource, Action::Read, ownership) {
        AccessLevel::ReadOnly
    } else {
        AccessLevel::Hidden
    }
}

/// [`get_access_level`] for the default `read` action.
pub fn read_access_level(
    permissions: &[Permission],
    resource: Resource,
    ownership: Ownership<'_>,
) -> AccessLevel {
    get_access_level(permissions, resource, Action::Read, ownership)
}
