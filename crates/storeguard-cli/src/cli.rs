//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use storeguard_authz::Authorizer;
use storeguard_common_config::PolicyLoader;
use storeguard_common_log::spans;

use crate::commands::{
    AccessCommand, CatalogCommand, CheckCommand, RolesCommand, RouteCommand, ValidateCommand,
};
use crate::error::{CliError, Exit};

/// Storeguard - storefront authorization inspector
///
/// Inspect the permission catalog, resolve permission checks, access levels
/// and route decisions against a policy file.
#[derive(Debug, Parser)]
#[command(
    name = "storeguard",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase verbosity level"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error logging"
    )]
    pub quiet: bool,

    /// Path to a policy file
    #[arg(
        short,
        long,
        global = true,
        env = "STOREGUARD_POLICY",
        value_hint = ValueHint::FilePath,
        help = "Path to a policy file (default: .storeguard/policy.yaml)"
    )]
    pub policy: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        value_enum,
        help = "Output format (text, json)"
    )]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the permission catalog, or one role's flattened permissions
    Catalog(CatalogCommand),

    /// Show role definitions and their grants
    Roles(RolesCommand),

    /// Check a permission for a role
    Check(CheckCommand),

    /// Resolve the UI access level for a resource action
    Access(AccessCommand),

    /// Decide whether a role may open a path
    Route(RouteCommand),

    /// Validate the policy file
    Validate(ValidateCommand),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::Roles(_) => "roles",
            Self::Check(_) => "check",
            Self::Access(_) => "access",
            Self::Route(_) => "route",
            Self::Validate(_) => "validate",
        }
    }
}

impl Cli {
    /// Loader for the selected policy source.
    pub fn loader(&self) -> PolicyLoader {
        PolicyLoader::resolve(self.policy.as_deref())
    }

    /// Execute the selected command
    pub fn execute(self) -> Result<Exit, CliError> {
        let ctx = CommandContext {
            loader: self.loader(),
            format: self.format,
        };

        let span = spans::command_span(self.command.name());
        let _entered = span.enter();

        match &self.command {
            Command::Catalog(cmd) => cmd.execute(&ctx),
            Command::Roles(cmd) => cmd.execute(&ctx),
            Command::Check(cmd) => cmd.execute(&ctx),
            Command::Access(cmd) => cmd.execute(&ctx),
            Command::Route(cmd) => cmd.execute(&ctx),
            Command::Validate(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub loader: PolicyLoader,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load the policy and build its authorizer.
    pub fn authorizer(&self) -> Result<Authorizer, CliError> {
        let path = self.loader.path();
        let span = spans::policy_span(&path.display().to_string());
        let _entered = span.enter();
        Ok(storeguard_common_log::timed!(
            "load_policy",
            self.loader.load_authorizer()
        )?)
    }
}
