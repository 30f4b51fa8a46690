//! Runtime settings.
//!
//! Settings are read from a TOML file and can be overridden from the command
//! line. Category mappings are fixed and are deliberately not part of the
//! file.
//!
//! # Configuration File Format
//!
//! ```toml
//! root = "/home/me/Downloads"
//! watch = "ask"          # "ask", "always" or "never"
//!
//! [settle]
//! mode = "fixed"         # "fixed" or "stable"
//! delay_ms = 1000        # fixed pause before moving a new file
//! poll_ms = 500          # stable: how often to check size/mtime
//! max_wait_ms = 60000    # stable: give up waiting after this long
//! ```

use crate::settle::SettlePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether to keep watching the root after the initial sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    /// Ask on standard input.
    #[default]
    Ask,
    Always,
    Never,
}

/// How new files are given time to finish writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettleMode {
    #[default]
    Fixed,
    Stable,
}

/// The `[settle]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    pub mode: SettleMode,
    pub delay_ms: u64,
    pub poll_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            mode: SettleMode::Fixed,
            delay_ms: 1000,
            poll_ms: 500,
            max_wait_ms: 60_000,
        }
    }
}

impl SettleConfig {
    /// Builds the policy the organizer applies to creation events.
    pub fn policy(&self) -> SettlePolicy {
        match self.mode {
            SettleMode::Fixed => SettlePolicy::Fixed(Duration::from_millis(self.delay_ms)),
            SettleMode::Stable => SettlePolicy::Stable {
                interval: Duration::from_millis(self.poll_ms.max(1)),
                max_wait: Duration::from_millis(self.max_wait_ms),
            },
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory to organize. Defaults to `~/Downloads`.
    pub root: Option<PathBuf>,
    pub watch: WatchMode,
    pub settle: SettleConfig,
}

impl Settings {
    /// Load settings from a file, with fallback to defaults.
    ///
    /// Attempts to load settings in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.downtidy.toml` in the current directory
    /// 3. Look for `~/.config/downtidy/config.toml` in home directory
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a file is explicitly provided but cannot be read,
    /// or if any file that is found fails to parse.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".downtidy.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".config").join("downtidy").join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings = toml::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// The directory to organize: the configured root or `~/Downloads`.
    pub fn root_dir(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.clone(),
            None => home_dir().unwrap_or_default().join("Downloads"),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
