//! Access command implementation.

use clap::Parser;
use serde::Serialize;
use storeguard_authz::{AccessLevel, Action, Resource, Role};

use crate::cli::CommandContext;
use crate::error::{CliError, Exit};
use crate::output::{print_output, FormattedOutput};

/// Resolve the UI access level for a resource action
#[derive(Debug, Parser)]
pub struct AccessCommand {
    /// Resource the control acts on
    pub resource: Resource,

    /// Action the control performs
    #[arg(default_value = "read")]
    pub action: Action,

    /// Role of the acting identity; anonymous when omitted
    #[arg(long, value_name = "ROLE")]
    pub role: Option<Role>,

    /// Id of the acting identity
    #[arg(long, default_value = "cli")]
    pub id: String,

    /// Owner of the target object; checked for owner-scoped grants
    #[arg(long, value_name = "ID")]
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
struct AccessOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    resource: Resource,
    action: Action,
    level: AccessLevel,
    visible: bool,
    interactive: bool,
}

impl FormattedOutput for AccessOutput {
    fn format_text(&self) -> String {
        let who = self
            .role
            .map(|r| r.to_string())
            .unwrap_or_else(|| "anonymous".to_string());
        format!("{}:{} for {who}: {}", self.resource, self.action, self.level)
    }
}

impl AccessCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let authz = ctx.authorizer()?;
        let identity = self.role.map(|role| authz.identity(self.id.as_str(), role));

        let level = authz.access_level(
            identity.as_ref(),
            self.resource,
            self.action,
            self.owner.as_deref(),
        );

        print_output(
            ctx,
            &AccessOutput {
                role: self.role,
                resource: self.resource,
                action: self.action,
                level,
                visible: level.is_visible(),
                interactive: level.can_interact(),
            },
        )?;
        Ok(Exit::Success)
    }
}
