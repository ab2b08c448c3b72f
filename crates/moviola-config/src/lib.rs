//! # moviola-config
//!
//! Process-wide configuration for the Moviola replay layer.
//!
//! Two views of the same settings live here:
//!
//! 1. [`Config`] — the on-disk TOML shape, loaded by tooling and tests.
//!    Sources, lowest to highest priority: `moviola.toml` in the working
//!    directory (or the file named by `MOVIOLA_CONFIG`), then environment
//!    variables (`MOVIOLA_PREVENT_SAVEFILES`, `MOVIOLA_DEBUG`).
//! 2. The runtime view — atomics consulted by the interposition layer on
//!    every decision. Hooks must call [`prevent_savefiles`] each time they
//!    classify a path; the flag can change at runtime and is never cached
//!    by callers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod logging;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// On-disk configuration shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub savefiles: SavefileConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SavefileConfig {
    /// Virtualize save files: suppress durable writes and track identity
    /// in the registry instead of touching the real filesystem.
    pub prevent: bool,
}

impl Default for SavefileConfig {
    fn default() -> Self {
        Self { prevent: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Mirror the shim's ring-buffer log to stderr.
    pub debug: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { debug: false }
    }
}

impl Config {
    /// Load from the standard locations. Missing files are not an error;
    /// they simply leave the defaults in place.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MOVIOLA_CONFIG").unwrap_or_else(|_| "moviola.toml".into());
        let mut config = if Path::new(&path).exists() {
            debug!("loading config from {path}");
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment overrides (highest priority).
    pub fn apply_env(&mut self) {
        if let Some(v) = env_flag("MOVIOLA_PREVENT_SAVEFILES") {
            self.savefiles.prevent = v;
        }
        if let Some(v) = env_flag("MOVIOLA_DEBUG") {
            self.logging.debug = v;
        }
    }

    /// Publish this configuration to the runtime view read by the hooks.
    pub fn install(&self) {
        PREVENT_SAVEFILES.store(self.savefiles.prevent, Ordering::SeqCst);
        DEBUG_OUTPUT.store(self.logging.debug, Ordering::SeqCst);
    }
}

fn env_flag(name: &str) -> Option<bool> {
    match std::env::var(name) {
        Ok(v) => Some(v == "1" || v.eq_ignore_ascii_case("true")),
        Err(_) => None,
    }
}

// ============================================================================
// Runtime view
// ============================================================================

static PREVENT_SAVEFILES: AtomicBool = AtomicBool::new(false);
static DEBUG_OUTPUT: AtomicBool = AtomicBool::new(false);

/// Is save-file virtualization enabled right now?
///
/// Re-read on every call; the flag may be flipped at runtime.
#[inline]
pub fn prevent_savefiles() -> bool {
    PREVENT_SAVEFILES.load(Ordering::SeqCst)
}

pub fn set_prevent_savefiles(value: bool) {
    PREVENT_SAVEFILES.store(value, Ordering::SeqCst);
}

/// Should shim diagnostics be mirrored to stderr?
#[inline]
pub fn debug_output() -> bool {
    DEBUG_OUTPUT.load(Ordering::Relaxed)
}

pub fn set_debug_output(value: bool) {
    DEBUG_OUTPUT.store(value, Ordering::Relaxed);
}

/// Read environment overrides and publish them to the runtime view.
///
/// Called from the shim's constructor; deliberately touches nothing but
/// `getenv`-backed state so it is safe before main-line initialization.
pub fn init_from_env() {
    let mut config = Config::default();
    config.apply_env();
    config.install();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_view_roundtrip() {
        set_prevent_savefiles(true);
        assert!(prevent_savefiles());
        set_prevent_savefiles(false);
        assert!(!prevent_savefiles());
    }

    #[test]
    fn defaults_are_passthrough() {
        let config = Config::default();
        assert!(!config.savefiles.prevent);
        assert!(!config.logging.debug);
    }

    #[test]
    fn toml_sections_parse() {
        let src = "[savefiles]\nprevent = true\n\n[logging]\ndebug = true\n";
        let config: Config = toml::from_str(src).unwrap();
        assert!(config.savefiles.prevent);
        assert!(config.logging.debug);
    }

    #[test]
    fn load_reads_the_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[savefiles]\nprevent = true\n").unwrap();

        std::env::set_var("MOVIOLA_CONFIG", &path);
        let config = Config::load().unwrap();
        std::env::remove_var("MOVIOLA_CONFIG");

        assert!(config.savefiles.prevent);
    }
}
