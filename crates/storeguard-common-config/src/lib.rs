//! Policy configuration for Storeguard.
//!
//! Loads `.storeguard/policy.yaml` (or an explicit file), expands
//! `${VAR}` / `${VAR:-default}` references, and validates the result into an
//! [`storeguard_authz::Authorizer`]. Sections the file omits fall back to the
//! built-in storefront policy.

pub mod env;
pub mod loader;
pub mod types;


pub use env::*;
pub use loader::*;
pub use types::*;
