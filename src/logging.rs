//! Optional `tracing-subscriber` setup for binaries and examples built on
//! this crate.
//!
//! The filter comes from `TASKPOD_LOG` (e.g. `debug`, `taskpod=trace`) and
//! defaults to `info`. Logs go to stderr.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "TASKPOD_LOG";

/// Install a global `fmt` subscriber.
///
/// # Errors
/// If a global subscriber is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
