//! Binary entrypoint for the `entsync` CLI.

use std::process::ExitCode;

use clap::Parser;
use entsync::cli::Cli;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    entsync::logging::init(cli.debug);

    // Recording and replay are selected in commands::dispatch via
    // ENTSYNC_RECORD=<file> and ENTSYNC_REPLAY=<file>.
    match entsync::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
