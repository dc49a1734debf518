//! Command implementations.

mod access;
mod catalog;
mod check;
mod roles;
mod route;
mod validate;

pub use access::AccessCommand;
pub use catalog::CatalogCommand;
pub use check::CheckCommand;
pub use roles::RolesCommand;
pub use route::RouteCommand;
pub use validate::ValidateCommand;

use storeguard_authz::{Authorizer, Role};

use crate::error::CliError;

/// Fail unless `role` is defined by the loaded policy.
fn require_role(authz: &Authorizer, role: Role) -> Result<(), CliError> {
    if authz.role_table().contains(role) {
        return Ok(());
    }
    let defined: Vec<&str> = authz.role_table().roles().map(Role::as_str).collect();
    Err(CliError::user_with_hint(
        format!("Role `{role}` is not defined by the policy"),
        format!("Defined roles: {}", defined.join(", ")),
    ))
}
