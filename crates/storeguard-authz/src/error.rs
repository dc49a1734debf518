//! Authorization configuration errors.
//!
//! Every variant describes a problem in the role table or route table.
//! They are raised while a policy is parsed or an [`Authorizer`] is built,
//! never while a decision is being made.
//!
//! [`Authorizer`]: crate::Authorizer

use crate::types::Role;
use thiserror::Error;

/// Errors raised while building or validating an authorization policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("unknown resource `{0}`")]
    UnknownResource(String),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("unknown role `{0}`")]
    UnknownRole(String),

    #[error("invalid permission key `{0}` (expected \"resource:action\")")]
    InvalidPermissionKey(String),

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    #[error("role `{0}` is defined more than once")]
    DuplicateRole(Role),

    #[error("route `{0}` is configured more than once")]
    DuplicateRoute(String),

    #[error("route `{route}` requires role `{role}` which has no definition in the role table")]
    UndefinedRole { route: String, role: Role },
}

impl AuthzError {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRoutePattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for policy construction.
pub type Result<T> = std::result::Result<T, AuthzError>;
