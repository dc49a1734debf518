//! Roles command implementation.

use clap::Parser;
use serde::Serialize;
use storeguard_authz::{Role, RoleDefinition};

use super::require_role;
use crate::cli::CommandContext;
use crate::error::{CliError, Exit};
use crate::output::{print_output, FormattedOutput};

/// Show role definitions
#[derive(Debug, Parser)]
pub struct RolesCommand {
    /// Role to show; every role when omitted
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct RolesOutput {
    roles: Vec<RoleDefinition>,
}

impl FormattedOutput for RolesOutput {
    fn format_text(&self) -> String {
        let mut out = Vec::new();
        for definition in &self.roles {
            out.push(definition.role.to_string());
            if definition.grants.is_empty() {
                out.push("  (no grants)".to_string());
            }
            for grant in &definition.grants {
                let actions: Vec<&str> = grant.actions.iter().map(|a| a.as_str()).collect();
                let scope = if grant.is_owned_only() { "  (own)" } else { "" };
                out.push(format!(
                    "  {:<15} {}{scope}",
                    grant.resource.as_str(),
                    actions.join(", ")
                ));
            }
        }
        out.join("\n")
    }
}

impl RolesCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let authz = ctx.authorizer()?;
        let table = authz.role_table();

        let roles = match self.role {
            Some(role) => {
                require_role(&authz, role)?;
                table
                    .definitions()
                    .iter()
                    .filter(|d| d.role == role)
                    .cloned()
                    .collect()
            }
            None => table.definitions().to_vec(),
        };

        print_output(ctx, &RolesOutput { roles })?;
        Ok(Exit::Success)
    }
}
