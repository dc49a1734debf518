//! Environment variable handling.

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    pub const STOREGUARD_POLICY: &str = "STOREGUARD_POLICY";
    pub const STOREGUARD_ENV: &str = "STOREGUARD_ENV";
}

/// Process environment access.
pub struct Environment;

impl Environment {
    /// Initialize environment from .env files in the current directory.
    pub fn init() -> Result<(), EnvError> {
        Self::init_from(env::current_dir().unwrap_or_default())
    }

    /// Initialize environment from .env files in `dir`.
    ///
    /// Files load in order `.env`, `.env.local`, `.env.<STOREGUARD_ENV>`.
    /// Variables already set are never overwritten.
    pub fn init_from(dir: impl AsRef<Path>) -> Result<(), EnvError> {
        let dir = dir.as_ref();
        load_optional(&dir.join(".env"))?;
        load_optional(&dir.join(".env.local"))?;

        if let Some(name) = Self::get(vars::STOREGUARD_ENV) {
            load_optional(&dir.join(format!(".env.{name}")))?;
        }

        Ok(())
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Policy file named by `STOREGUARD_POLICY`.
    pub fn policy_path() -> Option<PathBuf> {
        Self::get(vars::STOREGUARD_POLICY)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

fn load_optional(path: &Path) -> Result<(), EnvError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
