//! Storeguard CLI Library
//!
//! Core library components for the `storeguard` binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use error::{CliError, Exit};
