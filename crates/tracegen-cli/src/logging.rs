//! Log subscriber setup

use crate::config::CliConfig;
use tracing_subscriber::EnvFilter;

/// Install the stderr `fmt` subscriber.
///
/// `RUST_LOG` wins over the `-v`/`-q` level. Calling twice is a no-op.
pub fn init_logging(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.verbosity.shows_targets())
        .with_ansi(config.use_color)
        .try_init();
}
