//! Check command implementation.

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use storeguard_authz::{IdentityContext, PermissionKey, Role, TracingAuditSink};

use crate::cli::CommandContext;
use crate::error::{CliError, Exit};
use crate::output::{print_output, FormattedOutput};

/// Check a permission for a role
#[derive(Debug, Parser)]
pub struct CheckCommand {
    /// Role of the acting identity
    pub role: Role,

    /// Permission as `resource:action`
    pub permission: PermissionKey,

    /// Id of the acting identity
    #[arg(long, default_value = "cli")]
    pub id: String,

    /// Owner of the target object; checked for owner-scoped grants
    #[arg(long, value_name = "ID")]
    pub owner: Option<String>,

    /// Impersonate this role for the check
    #[arg(long = "as-role", value_name = "ROLE", requires = "as_id")]
    pub as_role: Option<Role>,

    /// Id of the impersonated identity
    #[arg(long = "as-id", value_name = "ID", requires = "as_role")]
    pub as_id: Option<String>,

    /// Exit with status 10 when the check is denied
    #[arg(long)]
    pub exit_status: bool,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    actor_id: String,
    identity_id: String,
    role: Role,
    permission: PermissionKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource_owner_id: Option<String>,
    impersonating: bool,
    granted: bool,
}

impl FormattedOutput for CheckOutput {
    fn format_text(&self) -> String {
        let verdict = if self.granted { "granted" } else { "denied" };
        let mut out = format!(
            "{verdict}: {} ({}) {}",
            self.identity_id, self.role, self.permission
        );
        if let Some(owner) = &self.resource_owner_id {
            out.push_str(&format!(" on object owned by {owner}"));
        }
        if self.impersonating {
            out.push_str(&format!(" [impersonated by {}]", self.actor_id));
        }
        out
    }
}

impl CheckCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let authz = ctx.authorizer()?;
        let sink = Arc::new(TracingAuditSink);
        let identities =
            IdentityContext::new(authz.identity(self.id.as_str(), self.role), sink.clone());

        if let (Some(role), Some(id)) = (self.as_role, self.as_id.as_deref()) {
            identities.start_impersonation(authz.identity(id, role));
        }

        let actor = identities.real();
        let effective = identities.effective();
        let granted = authz.authorize(
            &actor.id,
            &effective,
            self.permission.resource,
            self.permission.action,
            self.owner.as_deref(),
            sink.as_ref(),
        );

        let output = CheckOutput {
            actor_id: actor.id.clone(),
            identity_id: effective.id.clone(),
            role: effective.role,
            permission: self.permission,
            resource_owner_id: self.owner.clone(),
            impersonating: identities.is_impersonating(),
            granted,
        };
        identities.stop_impersonation();

        print_output(ctx, &output)?;
        Ok(match (granted, self.exit_status) {
            (false, true) => Exit::Denied,
            _ => Exit::Success,
        })
    }
}
