//! SDK lookups backed by plugins in the plugin directory.

use crate::config::Config;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};
use vfox_plugin::{discover_plugins, LuaPlugin, Package, PluginDescriptor, Version};
use vfox_runtime::HostConfig;

/// Version assumed when an SDK argument names none.
pub const LATEST: &str = "latest";

/// An SDK argument of the form `name[@version]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkArg {
    pub name: String,
    pub version: Version,
}

impl SdkArg {
    /// Check whether a specific version was requested.
    pub fn has_version(&self) -> bool {
        self.version.as_str() != LATEST
    }
}

impl FromStr for SdkArg {
    type Err = anyhow::Error;

    fn from_str(arg: &str) -> Result<Self> {
        let mut parts = arg.split('@');
        let name = parts.next().unwrap_or_default().to_lowercase();
        let version = parts.next();
        if parts.next().is_some() {
            bail!("invalid SDK argument '{arg}', expected name[@version]");
        }
        if name.is_empty() {
            bail!("invalid SDK argument '{arg}', missing SDK name");
        }

        let version = match version {
            Some(v) if !v.is_empty() => Version::from(v),
            _ => Version::from(LATEST),
        };
        Ok(Self { name, version })
    }
}

impl fmt::Display for SdkArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// What `info` reports about an SDK.
#[derive(Debug, Clone, Serialize)]
pub struct SdkInfo {
    pub plugin: PluginDescriptor,
    pub install_dir: PathBuf,
    /// Download plan for the requested version, if one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Package>,
}

/// One entry of the plugin listing.
#[derive(Debug, Clone, Serialize)]
pub struct PluginListing {
    pub name: String,
    pub path: PathBuf,
    pub version: String,
    pub description: String,
    /// Why the plugin failed to load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Finds plugins by SDK name and drives their read-only hooks.
#[derive(Debug, Clone)]
pub struct SdkManager {
    plugin_dir: PathBuf,
    sdk_dir: PathBuf,
    host: HostConfig,
}

impl SdkManager {
    /// Create a manager from the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            plugin_dir: config.plugin_dir()?,
            sdk_dir: config.sdk_dir()?,
            host: config.host_config(),
        })
    }

    /// Get the plugin directory.
    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Path the plugin for `name` is expected at.
    pub fn plugin_path(&self, name: &str) -> PathBuf {
        self.plugin_dir.join(format!("{name}.lua"))
    }

    /// Load the plugin for `name`, run `f` with it and close it again,
    /// whether `f` succeeds or not.
    pub fn with_plugin<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut LuaPlugin) -> Result<T>,
    ) -> Result<T> {
        let path = self.plugin_path(name);
        if !path.is_file() {
            bail!("{name} is not supported, no plugin at {}", path.display());
        }

        let mut plugin = LuaPlugin::from_file(&path, &self.host)
            .with_context(|| format!("Failed to load plugin: {}", path.display()))?;
        let result = f(&mut plugin);
        plugin.close();
        result
    }

    /// List the versions available for `name`.
    pub fn search(&self, name: &str) -> Result<Vec<Package>> {
        self.with_plugin(name, |plugin| {
            let packages = plugin
                .available()
                .with_context(|| format!("Failed to list versions of {}", plugin.name()))?;
            debug!("{} offers {} version(s)", plugin.name(), packages.len());
            Ok(packages)
        })
    }

    /// Describe the plugin for `sdk`, resolving the requested version.
    pub fn info(&self, sdk: &SdkArg) -> Result<SdkInfo> {
        self.with_plugin(&sdk.name, |plugin| {
            let resolved = if sdk.has_version() {
                plugin
                    .pre_install(&sdk.version)
                    .with_context(|| format!("Failed to resolve {}", plugin.label(&sdk.version)))?
            } else {
                None
            };

            Ok(SdkInfo {
                plugin: plugin.descriptor().clone(),
                install_dir: self.sdk_dir.join(&plugin.descriptor().filename),
                resolved,
            })
        })
    }

    /// List every plugin in the plugin directory, including those that
    /// fail to load.
    pub fn plugins(&self) -> Vec<PluginListing> {
        discover_plugins(&self.plugin_dir)
            .into_iter()
            .map(|source| match LuaPlugin::from_file(&source.path, &self.host) {
                Ok(plugin) => {
                    let descriptor = plugin.descriptor().clone();
                    plugin.close();
                    PluginListing {
                        name: source.name,
                        path: source.path,
                        version: descriptor.version,
                        description: descriptor.description,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Failed to load plugin {:?}: {}", source.path, e);
                    PluginListing {
                        name: source.name,
                        path: source.path,
                        version: String::new(),
                        description: String::new(),
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sdk_arg() {
        let arg: SdkArg = "Java@21".parse().unwrap();
        assert_eq!(arg.name, "java");
        assert_eq!(arg.version.as_str(), "21");
        assert!(arg.has_version());
        assert_eq!(arg.to_string(), "java@21");
    }

    #[test]
    fn test_parse_sdk_arg_defaults_to_latest() {
        let arg: SdkArg = "nodejs".parse().unwrap();
        assert_eq!(arg.version.as_str(), LATEST);
        assert!(!arg.has_version());

        let arg: SdkArg = "nodejs@".parse().unwrap();
        assert_eq!(arg.version.as_str(), LATEST);
    }

    #[test]
    fn test_parse_sdk_arg_rejects_malformed() {
        assert!("java@21@x".parse::<SdkArg>().is_err());
        assert!("@21".parse::<SdkArg>().is_err());
        assert!("".parse::<SdkArg>().is_err());
    }

    #[test]
    fn test_plugin_path() {
        let mut config = Config::default();
        config.plugin.path = Some(PathBuf::from("/plugins"));
        let manager = SdkManager::new(&config).unwrap();
        assert_eq!(manager.plugin_path("java"), PathBuf::from("/plugins/java.lua"));
    }
}
