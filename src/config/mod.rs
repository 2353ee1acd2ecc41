//! Configuration for the console host
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (`--config` path, or ~/.config/pagetree/config.toml)
//! 3. Built-in defaults (lowest priority)

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod console;
mod observability;
mod serialization;

#[cfg(test)]
mod tests;

pub use console::{ConsoleConfig, FileConsole};
pub use observability::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log level override
pub const ENV_LOG: &str = "PAGETREE_LOG";
/// Modal timeout override, in seconds
pub const ENV_MODAL_TIMEOUT: &str = "PAGETREE_MODAL_TIMEOUT";
/// Owner user id override
pub const ENV_OWNER: &str = "PAGETREE_OWNER";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub console: ConsoleConfig,
}

/// Config file structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// Optional [logging] section
    pub logging: Option<FileLogging>,

    /// Optional [console] section
    pub console: Option<FileConsole>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Default config file path: ~/.config/pagetree/config.toml
    ///
    /// Uses Unix-style ~/.config on all platforms for consistency.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("pagetree").join("config.toml"))
    }

    /// Load configuration from the process environment and `path` (or the
    /// default path).
    ///
    /// A missing file means defaults. A file that exists but can't be read or
    /// parsed is an error: a broken config should fail loudly rather than
    /// silently fall back.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Self::read_file(path)?,
            None => match Self::config_path() {
                Some(path) => Self::read_file(&path)?,
                None => FileConfig::default(),
            },
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => {
                Err(e).with_context(|| format!("cannot read config file {}", path.display()))
            }
        }
    }

    pub(crate) fn parse(contents: &str) -> Result<FileConfig> {
        Ok(toml::from_str(contents)?)
    }

    /// Merge file values with overrides looked up through `env`.
    pub(crate) fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut logging = LoggingConfig::from_file(file.logging)?;
        if let Some(level) = env(ENV_LOG) {
            logging.level = level;
        }

        let mut console = ConsoleConfig::from_file(file.console);
        if let Some(secs) = env(ENV_MODAL_TIMEOUT) {
            console.modal_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MODAL_TIMEOUT} must be a number of seconds"))?;
        }
        if let Some(owner) = env(ENV_OWNER) {
            console.owner_id = Some(
                owner
                    .trim()
                    .parse()
                    .with_context(|| format!("{ENV_OWNER} must be a user id"))?,
            );
        }

        Ok(Self { logging, console })
    }

    /// Write the default template to `path` unless a file is already there.
    ///
    /// Returns `true` if a file was written.
    pub fn write_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        std::fs::write(path, Self::default().to_toml())
            .with_context(|| format!("cannot write {}", path.display()))?;
        Ok(true)
    }
}
