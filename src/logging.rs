//! logging
//!
//! Subscriber setup for the `tracing` events emitted by the engine.
//!
//! The library itself only emits events; binaries and tests opt in to
//! output by calling one of these once at startup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Config;

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize logging with human-readable output.
///
/// Uses `RUST_LOG` if set, otherwise `default_level` (e.g. "info" or
/// "forgestate=debug,warn"). Subsequent calls are no-ops.
pub fn init_logging(service_name: &str, default_level: &str) {
    fmt()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .try_init()
        .ok();

    tracing::info!(service = service_name, "logging initialised (human-readable)");
}

/// Initialize logging with JSON lines output.
///
/// Same filter rules as [`init_logging`].
pub fn init_logging_json(service_name: &str, default_level: &str) {
    fmt()
        .json()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .try_init()
        .ok();

    tracing::info!(service = service_name, "logging initialised (json)");
}

/// Initialize logging from the `[logging]` table of a loaded config.
pub fn init_from_config(service_name: &str, config: &Config) {
    if config.log_json() {
        init_logging_json(service_name, config.log_level());
    } else {
        init_logging(service_name, config.log_level());
    }
}
