//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Env var overriding the verbosity flag, e.g. `NANOLYTICA_LOG=nanolytica_core=trace`.
const LOG_ENV: &str = "NANOLYTICA_LOG";

fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr so stdout stays parseable.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}
