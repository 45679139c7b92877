//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::{Error, Result};
use crate::reconcile::{Direction, RunMode};

/// Top-level CLI parser for `entsync`.
#[derive(Debug, Parser)]
#[command(
    name = "entsync",
    version,
    about = "Reconcile entitlements with the directory, the course registry and declared users"
)]
pub struct Cli {
    /// Configuration file. Defaults to $ENTSYNC_CONFIG, then ./entsync.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log per-user detail.
    #[arg(long, short = 'd', global = true, visible_alias = "verbose")]
    pub debug: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile all entitlements, or only the named ones.
    Update(UpdateArgs),
    /// Grant or revoke entitlements for specific users.
    Manage(ManageArgs),
    /// Print the entitlements a user currently holds.
    Show {
        /// User to look up.
        user: String,
    },
}

/// Arguments of `entsync update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Report differences without changing anything.
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Only grant; report what could be revoked.
    #[arg(long)]
    pub only_add: bool,

    /// Only revoke; report what could be granted.
    #[arg(long)]
    pub only_remove: bool,

    /// Entitlements to reconcile. All declared entitlements when omitted.
    #[arg(value_name = "ENTITLEMENT")]
    pub entitlements: Vec<String>,
}

impl UpdateArgs {
    /// The run mode selected by the flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if both `--only-add` and `--only-remove` are set.
    pub fn mode(&self) -> Result<RunMode> {
        Ok(RunMode {
            dry_run: self.dry_run,
            direction: Direction::from_flags(self.only_add, self.only_remove)?,
        })
    }
}

/// Arguments of `entsync manage`.
#[derive(Debug, Args)]
pub struct ManageArgs {
    /// Users to change. Read from stdin, one per line, when omitted.
    #[arg(value_name = "USER")]
    pub users: Vec<String>,

    /// Entitlement to grant. Repeatable.
    #[arg(long = "add", short = 'a', value_name = "ENTITLEMENT")]
    pub add: Vec<String>,

    /// Entitlement to revoke. Repeatable.
    #[arg(long = "remove", short = 'r', value_name = "ENTITLEMENT")]
    pub remove: Vec<String>,

    /// Leave the mapping file untouched.
    #[arg(long)]
    pub no_mapping_update: bool,
}

impl ManageArgs {
    /// Checks that at least one grant or revoke was requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActions`] otherwise.
    pub fn ensure_actions(&self) -> Result<()> {
        if self.add.is_empty() && self.remove.is_empty() {
            Err(Error::NoActions)
        } else {
            Ok(())
        }
    }
}
