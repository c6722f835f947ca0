//! Diagnostic logging to stderr

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "PIPIT_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber.
///
/// Installer passthrough output owns stdout, so logs go to stderr.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
