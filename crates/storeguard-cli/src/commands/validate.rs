//! Validate command implementation.

use clap::Parser;
use serde::Serialize;
use storeguard_authz::UnmatchedRoutePolicy;

use crate::cli::CommandContext;
use crate::error::{CliError, Exit};
use crate::output::{print_output, FormattedOutput};

/// Validate the policy file
#[derive(Debug, Parser)]
pub struct ValidateCommand {}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    source: String,
    builtin: bool,
    roles: usize,
    routes: usize,
    permissions: usize,
    unmatched_routes: UnmatchedRoutePolicy,
}

impl FormattedOutput for ValidateOutput {
    fn format_text(&self) -> String {
        let source = if self.builtin {
            format!("built-in policy ({} not found)", self.source)
        } else {
            self.source.clone()
        };
        let unmatched = match self.unmatched_routes {
            UnmatchedRoutePolicy::Allow => "allow",
            UnmatchedRoutePolicy::Deny => "deny",
        };
        format!(
            "✓ {source}: {} roles, {} routes, {} permissions, unmatched routes {unmatched}",
            self.roles, self.routes, self.permissions
        )
    }
}

impl ValidateCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let path = ctx.loader.path();
        let authz = ctx.authorizer()?;

        print_output(
            ctx,
            &ValidateOutput {
                source: path.display().to_string(),
                builtin: !path.exists(),
                roles: authz.role_table().len(),
                routes: authz.route_table().len(),
                permissions: authz.catalog().len(),
                unmatched_routes: authz.unmatched_policy(),
            },
        )?;
        Ok(Exit::Success)
    }
}
