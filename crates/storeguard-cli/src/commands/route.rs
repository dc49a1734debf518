//! Route command implementation.

use std::collections::BTreeMap;

use clap::Parser;
use serde::Serialize;
use storeguard_authz::{Role, RouteDecision, TracingAuditSink};

use crate::cli::CommandContext;
use crate::error::{CliError, Exit};
use crate::output::{print_output, FormattedOutput};

/// Decide whether a role may open a path
#[derive(Debug, Parser)]
pub struct RouteCommand {
    /// Role of the acting identity
    pub role: Role,

    /// Request path, e.g. `/seller/42/orders`
    pub path: String,

    /// Id of the acting identity
    #[arg(long, default_value = "cli")]
    pub id: String,

    /// Exit with status 10 when the route is denied
    #[arg(long)]
    pub exit_status: bool,
}

#[derive(Debug, Serialize)]
struct RouteOutput {
    path: String,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
    #[serde(flatten)]
    decision: RouteDecision,
}

impl FormattedOutput for RouteOutput {
    fn format_text(&self) -> String {
        let verdict = if self.decision.can_access { "allow" } else { "deny" };
        let mut out = format!("{verdict} {} for {}", self.path, self.role);

        match &self.matched {
            Some(pattern) if self.params.is_empty() => {
                out.push_str(&format!(" (matched {pattern})"))
            }
            Some(pattern) => {
                let params: Vec<String> =
                    self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                out.push_str(&format!(" (matched {pattern}, {})", params.join(", ")));
            }
            None => out.push_str(" (no matching route)"),
        }

        if let Some(reason) = &self.decision.reason {
            out.push_str(&format!(": {reason}"));
        }
        if let Some(target) = &self.decision.redirect_to {
            out.push_str(&format!(" -> {target}"));
        }
        out
    }
}

impl RouteCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<Exit, CliError> {
        let authz = ctx.authorizer()?;
        let identity = authz.identity(self.id.as_str(), self.role);

        let (matched, params) = match authz.route_table().match_path(&self.path) {
            Some(m) => (
                Some(m.config.pattern.to_string()),
                m.params
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_string()))
                    .collect(),
            ),
            None => (None, BTreeMap::new()),
        };

        let decision =
            authz.authorize_route(&identity.id, &identity, &self.path, &TracingAuditSink);
        let denied = !decision.can_access;

        print_output(
            ctx,
            &RouteOutput {
                path: self.path.clone(),
                role: self.role,
                matched,
                params,
                decision,
            },
        )?;

        Ok(if denied && self.exit_status {
            Exit::Denied
        } else {
            Exit::Success
        })
    }
}
