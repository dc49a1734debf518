//! CLI error handling and formatting.

use std::io;
use std::process::ExitCode;

use serde_json::json;
use storeguard_authz::AuthzError;
use storeguard_common_config::ConfigError;
use thiserror::Error;

use crate::cli::OutputFormat;

/// Application exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
    ValidationError = 5,
    /// A check or route decision came back negative under `--exit-status`.
    Denied = 10,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

/// CLI error type with context
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("{message}")]
    Validation {
        message: String,
        hint: Option<String>,
    },

    #[error("{message}")]
    User {
        message: String,
        hint: Option<String>,
    },
}

impl CliError {
    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "E001",
            Self::Io { .. } => "E002",
            Self::Validation { .. } => "E004",
            Self::User { .. } => "E010",
        }
    }

    pub fn exit(&self) -> Exit {
        match self {
            Self::Config { .. } => Exit::ConfigError,
            Self::Io { .. } => Exit::IoError,
            Self::Validation { .. } => Exit::ValidationError,
            Self::User { .. } => Exit::GeneralError,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        self.exit().into()
    }

    /// Get hint for this error if available
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } | Self::Validation { hint, .. } | Self::User { hint, .. } => {
                hint.as_deref()
            }
            Self::Io { .. } => None,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            hint: None,
        }
    }

    /// Create a user error with hint
    pub fn user_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Print the error to stderr in the selected format.
    pub fn report(&self, format: OutputFormat) {
        eprintln!("{}", self.render(format));
    }

    /// Render the error as it would be reported.
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => json!({
                "error": {
                    "code": self.code(),
                    "message": self.to_string(),
                    "hint": self.hint(),
                }
            })
            .to_string(),
            OutputFormat::Text => {
                let mut out = format!("error[{}]: {self}", self.code());
                if let Some(hint) = self.hint() {
                    out.push_str("\n\nhint: ");
                    out.push_str(hint);
                }
                out
            }
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::User {
            message: format!("JSON serialization failed: {err}"),
            hint: None,
        }
    }
}

impl From<AuthzError> for CliError {
    fn from(err: AuthzError) -> Self {
        Self::Validation {
            message: err.to_string(),
            hint: None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(inner) => Self::Validation {
                message: format!("Invalid policy: {inner}"),
                hint: Some("Run `storeguard validate` to check the policy file".to_string()),
            },
            not_found @ ConfigError::NotFound { .. } => Self::Config {
                message: format!("Configuration error: {not_found}"),
                hint: Some("Check --policy or STOREGUARD_POLICY".to_string()),
                source: Some(Box::new(not_found)),
            },
            other => Self::Config {
                message: format!("Configuration error: {other}"),
                source: Some(Box::new(other)),
                hint: None,
            },
        }
    }
}
