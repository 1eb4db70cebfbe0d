//! Logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to every target.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
