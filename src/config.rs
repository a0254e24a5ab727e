//! Configuration management for the keylayout tool
//!
//! Settings live in a platform-specific TOML file. Every section is
//! optional; missing keys fall back to their defaults.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/keylayout/config.toml` |
//! | macOS | `~/Library/Application Support/keylayout/config.toml` |
//! | Windows | `%APPDATA%\keylayout\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use keylayout::config::{Config, KernelGate};
//!
//! // Load existing config or use defaults
//! let mut config = Config::load().unwrap_or_default();
//!
//! // Always check requires_kernel_config lines against the host
//! config.kernel.gate = KernelGate::Always;
//!
//! // Save to disk
//! config.save().expect("Failed to save config");
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the path to the config file.
///
/// The directory is not created; [`Config::save`] does that.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("keylayout").join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Kernel configuration gate settings
    #[serde(default)]
    pub kernel: KernelConfigSettings,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// When `requires_kernel_config` lines are enforced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelGate {
    /// Enforce only on device builds
    #[default]
    Auto,
    /// Enforce against the host kernel
    Always,
    /// Never enforce
    Never,
}

/// Kernel configuration gate settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfigSettings {
    pub gate: KernelGate,
    /// Kernel config files tried before `/proc/config.gz` and `/boot`
    pub config_paths: Vec<PathBuf>,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for everything
    pub level: String,
    /// Trace every parsed line and directive
    pub debug_parser: bool,
    /// Trace every lookup on a loaded layout
    pub debug_mapping: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            debug_parser: false,
            debug_mapping: false,
        }
    }
}

impl LoggingConfig {
    /// Filter string in `env_logger` syntax
    pub fn filter(&self) -> String {
        let mut filter = self.level.clone();
        if self.debug_parser {
            filter.push_str(",keylayout::parser=debug");
        }
        if self.debug_mapping {
            filter.push_str(",keylayout::mapping=debug");
        }
        filter
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
