//! Catalog command implementation.

use clap::Parser;
use serde::Serialize;
use storeguard_authz::{Permission, Role};

use super::require_role;
use crate::cli::CommandContext;
use crate::error::{CliError, Exit};
use crate::output::{print_output, FormattedOutput, Table};

/// List the permission catalog
#[derive(Debug, Parser)]
pub struct CatalogCommand {
    /// Show only the permissions this role holds
    #[arg(long, value_name = "ROLE")]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct CatalogOutput {
    permissions: Vec<Permission>,
}

impl FormattedOutput for CatalogOutput {
    fn format_text(&self) -> String {
        let mut table = Table::new(["ID", "PERMISSION", "DESCRIPTION"]);
        for permission in &self.permissions {
            let id = match permission.id {
                0 => "-".to_string(),
                id => id.to_string(),
            };
            table.row([id, permission.key().to_string(), permission.description.clone()]);
        }
        table.render()
    }
}

impl CatalogCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let authz = ctx.authorizer()?;

        let permissions = match self.role {
            Some(role) => {
                require_role(&authz, role)?;
                authz.permissions_of(role)
            }
            None => authz.catalog().as_slice().to_vec(),
        };

        print_output(ctx, &CatalogOutput { permissions })?;
        Ok(Exit::Success)
    }
}
