//! Logging initialization.
//!
//! Logs go to stderr so query output on stdout stays machine-readable.
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter: `RUST_LOG` if set and valid, otherwise the configured
/// level, otherwise `info`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(config: &LoggingConfig) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(stderr_layer)
        .try_init();
}
