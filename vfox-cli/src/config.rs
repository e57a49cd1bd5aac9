//! Configuration file loading and management
//!
//! This module handles loading and parsing the configuration from
//! `$XDG_CONFIG_HOME/vfox/config.toml`. If the configuration file doesn't
//! exist, a default configuration is created with documented comments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vfox_runtime::HostConfig;

/// Longest per-hook deadline accepted, in seconds.
const MAX_HOOK_TIMEOUT_SECS: u64 = 3600;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Proxy handed to plugins for downloads
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Where SDKs are installed
    #[serde(default)]
    pub storage: StorageConfig,
    /// Plugin lookup and execution
    #[serde(default)]
    pub plugin: PluginConfig,
    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

/// Proxy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProxyConfig {
    /// Whether plugins should use the proxy
    /// Default: false
    #[serde(default)]
    pub enable: bool,
    /// Proxy URL, e.g. "http://127.0.0.1:7890"
    #[serde(default)]
    pub url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Directory SDKs are installed into
    /// If None, uses XDG_DATA_HOME/vfox/sdks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_path: Option<PathBuf>,
}

/// Plugin configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PluginConfig {
    /// Directory holding `<name>.lua` plugin files
    /// If None, uses XDG_DATA_HOME/vfox/plugins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Deadline for a single hook call in seconds; 0 disables it
    /// Default: 0
    #[serde(default)]
    pub hook_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Default: "warn"
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the specified path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default XDG config location
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// file with documented comments.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_file(&config_path)?;
        }

        Self::load(&config_path)
    }

    /// Get the default configuration file path
    ///
    /// Returns `$XDG_CONFIG_HOME/vfox/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Create a default configuration file with documented comments
    pub fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    /// Generate the default configuration file content with comments
    fn default_config_content() -> String {
        r#"# vfox Configuration

[proxy]
# Hand a proxy to plugins for their downloads
# Default: false
enable = false
# url = "http://127.0.0.1:7890"

[storage]
# Directory SDKs are installed into
# If not specified, defaults to $XDG_DATA_HOME/vfox/sdks
# sdk_path = "/path/to/sdks"

[plugin]
# Directory holding <name>.lua plugin files
# If not specified, defaults to $XDG_DATA_HOME/vfox/plugins
# path = "/path/to/plugins"

# Deadline for a single plugin hook call, in seconds. 0 lets hooks run
# until they return.
# Default: 0
hook_timeout_secs = 0

[log]
# Log level: trace, debug, info, warn, error
# RUST_LOG takes precedence when set.
# Default: "warn"
level = "warn"
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.log.level,
                valid_log_levels.join(", ")
            );
        }

        if self.proxy.enable {
            let schemes = ["http://", "https://", "socks5://"];
            if !schemes.iter().any(|scheme| self.proxy.url.starts_with(scheme)) {
                anyhow::bail!(
                    "Invalid proxy url: '{}'. Must start with one of: {}",
                    self.proxy.url,
                    schemes.join(", ")
                );
            }
        }

        if self.plugin.hook_timeout_secs > MAX_HOOK_TIMEOUT_SECS {
            anyhow::bail!(
                "plugin.hook_timeout_secs must not exceed {}",
                MAX_HOOK_TIMEOUT_SECS
            );
        }

        Ok(())
    }

    /// Get the plugin directory
    ///
    /// Returns the configured path or the default XDG data directory path
    pub fn plugin_dir(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.plugin.path {
            return Ok(path.clone());
        }
        Ok(project_dirs()?.data_dir().join("plugins"))
    }

    /// Get the SDK install directory
    ///
    /// Returns the configured path or the default XDG data directory path
    pub fn sdk_dir(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.storage.sdk_path {
            return Ok(path.clone());
        }
        Ok(project_dirs()?.data_dir().join("sdks"))
    }

    /// Build the settings plugin runtimes are prepared with.
    pub fn host_config(&self) -> HostConfig {
        let mut host = HostConfig::default().with_runtime_version(env!("CARGO_PKG_VERSION"));
        if self.proxy.enable {
            host = host.with_proxy(self.proxy.url.clone());
        }
        if self.plugin.hook_timeout_secs > 0 {
            host = host.with_hook_timeout(Duration::from_secs(self.plugin.hook_timeout_secs));
        }
        host
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "version-fox", "vfox")
        .context("Failed to determine project directories")
}
