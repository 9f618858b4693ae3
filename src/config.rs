//! Configuration from environment variables.
//!
//! Everything has a default; nothing here can fail. `MESON` selects the
//! meson executable (same variable meson's own tooling honors) and
//! `SOURCE_DATE_EPOCH` sets the synthetic timestamp stamped on every
//! archive member.

use std::env;

/// Default synthetic timestamp for archive members.
pub const DEFAULT_EPOCH: u64 = 0;

/// srcpack configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Meson executable to invoke for introspection (default: "meson").
    pub meson_program: String,
    /// Modification time stamped on every archive member.
    pub source_date_epoch: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meson_program: "meson".to_string(),
            source_date_epoch: DEFAULT_EPOCH,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// An unparsable SOURCE_DATE_EPOCH is ignored rather than fatal: a
    /// broken variable should not make sdist builds fail, it just loses
    /// the caller-chosen timestamp.
    pub fn load() -> Self {
        let meson_program = env::var("MESON")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "meson".to_string());

        let source_date_epoch = env::var("SOURCE_DATE_EPOCH")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_EPOCH);

        Self {
            meson_program,
            source_date_epoch,
        }
    }
}
