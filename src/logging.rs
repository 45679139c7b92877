//! Tracing subscriber setup for the binary.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a compact stderr subscriber.
///
/// The default level is `info`, or `debug` when `debug` is set. `RUST_LOG`
/// takes precedence over both. Calling this more than once is harmless.
pub fn init(debug: bool) {
    let default = if debug { "entsync=debug" } else { "entsync=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}
