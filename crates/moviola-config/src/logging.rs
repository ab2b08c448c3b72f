//! `tracing` setup for the non-interposed crates.
//!
//! The shim itself never routes diagnostics through `tracing` — inside a
//! hook, formatting must not allocate and output must not re-enter an
//! intercepted function — so it carries its own ring-buffer sink. This
//! helper covers everything else: library tests, tooling, and any process
//! that embeds the registry directly.

/// Log levels for runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Initialize logging with the given level filter.
/// Call this once at application startup; `RUST_LOG` wins if set.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
