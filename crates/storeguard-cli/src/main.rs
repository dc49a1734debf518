//! Storeguard CLI - storefront authorization inspector
//!
//! Main entry point for the `storeguard` binary.

use std::process::ExitCode;

use clap::Parser;
use storeguard_cli::cli::Cli;
use storeguard_common_config::Environment;
use storeguard_common_log::LogConfig;

fn main() -> ExitCode {
    // .env files must be loaded before clap reads STOREGUARD_POLICY.
    let env_result = Environment::init();

    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = env_result {
        tracing::warn!("Ignoring .env files: {e}");
    }

    let format = cli.format;
    match cli.execute() {
        Ok(exit) => exit.into(),
        Err(e) => {
            tracing::debug!(code = e.code(), error = %e, "Command failed");
            e.report(format);
            e.exit_code()
        }
    }
}

fn init_logging(cli: &Cli) {
    let config = LogConfig::from_env().with_verbosity(cli.verbose, cli.quiet);
    let config = if std::env::var_os("NO_COLOR").is_some() {
        config.without_ansi()
    } else {
        config
    };

    if let Err(e) = storeguard_common_log::init(config) {
        eprintln!("warning: {e}");
    }
}
