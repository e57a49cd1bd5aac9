//! Host settings visible to plugins, and the `host` module exposing them.

use crate::platform;
use mlua::{Lua, Table};
use std::time::Duration;

/// Name under which the host module is registered for `require`.
pub const HOST_MODULE: &str = "host";

/// Host settings a plugin runtime is prepared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Value of the `OS_TYPE` global.
    pub os_type: String,

    /// Value of the `ARCH_TYPE` global.
    pub arch_type: String,

    /// Host version, passed to every hook as `runtimeVersion`.
    pub runtime_version: String,

    /// Proxy URL plugins should use for downloads, if any.
    pub proxy_url: Option<String>,

    /// Deadline for a single hook call. `None` lets hooks run indefinitely.
    pub hook_timeout: Option<Duration>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            os_type: platform::os_type().to_string(),
            arch_type: platform::arch_type().to_string(),
            runtime_version: env!("CARGO_PKG_VERSION").to_string(),
            proxy_url: None,
            hook_timeout: None,
        }
    }
}

impl HostConfig {
    /// Set the host version reported to plugins.
    pub fn with_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = version.into();
        self
    }

    /// Set the proxy URL exposed through the host module.
    pub fn with_proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Set the per-call deadline.
    pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = Some(timeout);
        self
    }
}

/// Register the host module in `package.loaded`, so `require("host")`
/// returns it without touching the filesystem.
pub(crate) fn install_host_module(lua: &Lua, config: &HostConfig) -> mlua::Result<()> {
    let module = lua.create_table()?;
    module.set("os_type", config.os_type.as_str())?;
    module.set("arch_type", config.arch_type.as_str())?;
    module.set("runtime_version", config.runtime_version.as_str())?;
    if let Some(proxy) = &config.proxy_url {
        module.set("proxy_url", proxy.as_str())?;
    }
    if let Some(timeout) = config.hook_timeout {
        module.set("hook_timeout_ms", timeout.as_millis() as i64)?;
    }

    let package: Table = lua.globals().get("package")?;
    let loaded: Table = package.get("loaded")?;
    loaded.set(HOST_MODULE, module)?;
    Ok(())
}
