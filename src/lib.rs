//! Entitlement reconciliation.
//!
//! `entsync` keeps the entitlements recorded in an identity directory in line
//! with a declaration file. Each declaration names a resolver (a directory
//! filter, a course registry query, a single user, or nobody) whose members
//! should hold the entitlement; a run grants and revokes the difference
//! through a Kerberos-authenticated entitlement service.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod directory;
pub mod entitlement;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod ports;
pub mod reconcile;
pub mod resolve;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

/// Run the CLI with already-parsed arguments.
///
/// # Errors
///
/// Returns the error that ended the command.
pub fn run(cli: &cli::Cli) -> Result<()> {
    commands::dispatch(cli)
}
