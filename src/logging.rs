//! Log output setup.
//!
//! Events go to stderr so the run summary on stdout stays machine-readable.
//! The filter comes from `BAKE_LOG` (e.g. `BAKE_LOG=sitebake=debug`),
//! defaulting to `info`, or `debug` when verbose.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "BAKE_LOG";

/// Build the event filter.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .without_time()
        .try_init();
}
