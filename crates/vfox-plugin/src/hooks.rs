//! Hook contexts and results, as the tables plugins see.
//!
//! Field tags are the keys plugins read and write, so they are part of the
//! plugin contract and must not change.

use crate::sdk::Info;
use std::collections::BTreeMap;
use vfox_luai::record;

pub const AVAILABLE_HOOK: &str = "Available";
pub const PRE_INSTALL_HOOK: &str = "PreInstall";
pub const POST_INSTALL_HOOK: &str = "PostInstall";
pub const ENV_KEYS_HOOK: &str = "EnvKeys";
pub const PRE_USE_HOOK: &str = "PreUse";

record! {
    /// An artifact as passed to and returned from hooks.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct LuaSdkInfo {
        pub name: String as "name",
        pub version: String as "version",
        pub path: String as "path",
        pub note: String as "note",
    }
}

impl From<&Info> for LuaSdkInfo {
    fn from(info: &Info) -> Self {
        Self {
            name: info.name.clone(),
            version: info.version.to_string(),
            path: info.path.clone(),
            note: info.note.clone(),
        }
    }
}

record! {
    /// An artifact as `PreInstall` returns it. The download location may be
    /// given as `url` instead of `path`.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct PreInstallHookResultItem {
        pub name: String as "name",
        pub version: String as "version",
        pub path: String as "path",
        pub url: String as "url",
        pub note: String as "note",
    }
}

impl PreInstallHookResultItem {
    /// Download location, preferring `path` over `url`.
    pub fn location(&self) -> &str {
        if self.path.is_empty() {
            &self.url
        } else {
            &self.path
        }
    }
}

record! {
    /// Checksum fields an install result may carry.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct LuaChecksum {
        pub sha256: String as "sha256",
        pub sha512: String as "sha512",
        pub sha1: String as "sha1",
        pub md5: String as "md5",
    }
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct AvailableHookCtx {
        pub runtime_version: String as "runtimeVersion",
    }
}

record! {
    /// One entry of the list `Available` returns. Its `addition` list is
    /// read entry by entry, see [`LuaSdkInfo`].
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct AvailableHookResultItem {
        pub version: String as "version",
        pub note: String as "note",
    }
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct PreInstallHookCtx {
        pub version: String as "version",
        pub runtime_version: String as "runtimeVersion",
    }
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct PostInstallHookCtx {
        pub runtime_version: String as "runtimeVersion",
        pub root_path: String as "rootPath",
        pub sdk_info: BTreeMap<String, LuaSdkInfo> as "sdkInfo",
    }
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct EnvKeysHookCtx {
        /// Install path of the main artifact. Kept for plugins written
        /// before `main` existed.
        pub path: String as "path",
        pub runtime_version: String as "runtimeVersion",
        pub main: LuaSdkInfo as "main",
        pub sdk_info: BTreeMap<String, LuaSdkInfo> as "sdkInfo",
    }
}

record! {
    /// One `{ key, value }` pair returned by `EnvKeys`.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct EnvKeysHookResultItem {
        pub key: String as "key",
        pub value: String as "value",
    }
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct PreUseHookCtx {
        pub runtime_version: String as "runtimeVersion",
        pub cwd: String as "cwd",
        pub scope: String as "scope",
        pub version: String as "version",
        pub previous_version: String as "previousVersion",
        pub installed_sdks: BTreeMap<String, LuaSdkInfo> as "installedSdks",
    }
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct PreUseHookResult {
        pub version: String as "version",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::Version;
    use vfox_luai::{Marshal, Table, Unmarshal, Value};

    #[test]
    fn test_env_keys_ctx_layout() {
        let main = Info {
            name: "java".to_string(),
            version: Version::from("21"),
            path: "/sdks/java/21".to_string(),
            ..Default::default()
        };
        let ctx = EnvKeysHookCtx {
            path: main.path.clone(),
            runtime_version: "0.1.0".to_string(),
            main: LuaSdkInfo::from(&main),
            sdk_info: BTreeMap::new(),
        };

        let value = ctx.marshal().unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.string("path"), Some("/sdks/java/21"));
        assert_eq!(table.string("runtimeVersion"), Some("0.1.0"));
        let main = table.get_str("main").unwrap().as_table().unwrap();
        assert_eq!(main.string("version"), Some("21"));
        assert!(table.get_str("sdkInfo").unwrap().as_table().is_some());
    }

    #[test]
    fn test_available_item_ignores_additions() {
        let mut addition = Table::new();
        addition.set("name", "jfx");
        let mut item = Table::new();
        item.set("version", "21.0.1");
        item.set("note", "LTS");
        item.set("addition", Table::sequence(vec![Value::Table(addition)]));

        let mut decoded = AvailableHookResultItem::default();
        decoded.unmarshal(&Value::Table(item)).unwrap();

        assert_eq!(decoded.version, "21.0.1");
        assert_eq!(decoded.note, "LTS");
    }

    #[test]
    fn test_pre_install_item_location() {
        let mut table = Table::new();
        table.set("version", "1.0");
        table.set("url", "https://example.com/sdk-1.0.tgz");

        let mut item = PreInstallHookResultItem::default();
        item.unmarshal(&Value::Table(table.clone())).unwrap();
        assert_eq!(item.location(), "https://example.com/sdk-1.0.tgz");

        table.set("path", "/mirror/sdk-1.0.tgz");
        let mut item = PreInstallHookResultItem::default();
        item.unmarshal(&Value::Table(table)).unwrap();
        assert_eq!(item.location(), "/mirror/sdk-1.0.tgz");
    }
}
