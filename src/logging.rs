//! Logging init for the `anypath` binary: structured events on stderr.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the application.

use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity level (`-v` count).
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,anypath=info",
        _ => "debug,anypath=debug",
    }
}

/// Initialize logging to stderr. `RUST_LOG` overrides the verbosity level.
///
/// Stdout is reserved for file contents, so events never go there.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let fallback = if quiet { "error" } else { default_filter(verbosity) };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Ignore the error when a subscriber is already installed (tests, embedding).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
