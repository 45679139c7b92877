//! Command dispatch and handlers.

pub mod manage;
pub mod show;
pub mod update;

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::error::{Error, Result};

/// Environment variable naming a cassette to record into.
pub const RECORD_ENV: &str = "ENTSYNC_RECORD";
/// Environment variable naming a cassette to replay from.
pub const REPLAY_ENV: &str = "ENTSYNC_REPLAY";

/// Dispatch a parsed command to its handler.
///
/// Arguments are validated before any connection is opened. When
/// `ENTSYNC_REPLAY` is set every external port is served from that cassette;
/// when `ENTSYNC_RECORD` is set the live ports are recorded into it.
///
/// # Errors
///
/// Returns the first fatal error, or [`Error::OperationsFailed`] when the
/// command completed with failed operations.
pub fn dispatch(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Update(args) => {
            let mode = args.mode()?;
            let ctx = context(&settings)?;
            update::run(&ctx, &settings, &args.entitlements, mode, &mut out)
        }
        Command::Manage(args) => {
            args.ensure_actions()?;
            let ctx = context(&settings)?;
            manage::run(&ctx, &settings, args, io::stdin().lock(), &mut out)
        }
        Command::Show { user } => {
            let ctx = context(&settings)?;
            show::run(&ctx, &settings, user, &mut out)
        }
    }
}

fn context(settings: &Settings) -> Result<ServiceContext> {
    if let Ok(path) = env::var(REPLAY_ENV) {
        info!(cassette = %path, "replaying");
        ServiceContext::replaying(Path::new(&path))
    } else if let Ok(path) = env::var(RECORD_ENV) {
        info!(cassette = %path, "recording");
        ServiceContext::recording(settings, &PathBuf::from(path))
    } else {
        ServiceContext::live(settings)
    }
}

/// Writes one line of command output.
pub(crate) fn emit(out: &mut impl Write, line: impl std::fmt::Display) -> Result<()> {
    writeln!(out, "{line}")
        .map_err(|e| Error::Io { path: PathBuf::from("<stdout>"), message: e.to_string() })
}
