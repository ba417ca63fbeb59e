//! Logging setup for the schemagraft server.
//!
//! Tracing starts before configuration is read, at `info`, so config and
//! schema-load failures are logged. Once `[logging]` is loaded the filter is
//! swapped in place through a reload handle. `RUST_LOG` always takes
//! precedence over the configured level.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

const BOOT_LEVEL: &str = "info";

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

/// Installs the global subscriber with the boot-time filter.
pub fn init_tracing() {
    let (reload_layer, handle) = reload::Layer::new(build_filter(env_directives().as_deref(), BOOT_LEVEL));
    let _ = LOG_RELOAD_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Switches the active filter to the configured level.
pub fn apply_logging_config(logging: &LoggingConfig) {
    let directives = env_directives();
    let filter = build_filter(directives.as_deref(), &logging.level);
    if let Some(handle) = LOG_RELOAD_HANDLE.get()
        && handle.modify(|f| *f = filter).is_ok()
    {
        tracing::debug!(
            level = %logging.level,
            rust_log = directives.is_some(),
            "Logging filter applied"
        );
    }
}

fn env_directives() -> Option<String> {
    std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// `RUST_LOG` directives when they parse, otherwise the configured level.
fn build_filter(directives: Option<&str>, level: &str) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}
