//! Loaded plugins and their lifecycle hooks.
//!
//! A [`LuaPlugin`] owns the interpreter its source runs in. Every hook call
//! follows the same path: build the context record, marshal it, call
//! `PLUGIN:Hook(ctx)`, take the returned value and turn it into domain types.

use crate::error::{HookContractError, PluginError, PluginResult};
use crate::hooks::{
    AvailableHookCtx, AvailableHookResultItem, EnvKeysHookCtx, EnvKeysHookResultItem,
    LuaSdkInfo, PostInstallHookCtx, PreInstallHookCtx, PreInstallHookResultItem, PreUseHookCtx,
    PreUseHookResult, AVAILABLE_HOOK, ENV_KEYS_HOOK, POST_INSTALL_HOOK, PRE_INSTALL_HOOK, PRE_USE_HOOK,
};
use crate::sdk::{Checksum, Envs, Info, Package, UseScope, Version};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use vfox_luai::{CodecError, Marshal, Table, Unmarshal, Value};
use vfox_runtime::{Callable, HostConfig, LuaVm, RuntimeError, ScriptObject};

/// Global the plugin source must define.
pub const PLUGIN_OBJECT: &str = "PLUGIN";

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").expect("plugin name pattern is valid")
});

/// Check a plugin name: a letter followed by letters, digits or underscores.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Identity and metadata of a loaded plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    /// Path the plugin source was loaded from.
    pub filepath: PathBuf,

    /// File stem of the source path; the alias the SDK is installed under.
    pub filename: String,

    /// Name the plugin declares.
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    pub update_url: String,

    /// Oldest host version the plugin supports. Empty if unrestricted.
    pub min_runtime_version: String,
}

impl PluginDescriptor {
    /// Check whether the plugin declares a minimum host version above
    /// `runtime_version`. Versions compare by dotted numeric components.
    pub fn requires_newer_runtime(&self, runtime_version: &str) -> bool {
        if self.min_runtime_version.is_empty() {
            return false;
        }
        version_components(&self.min_runtime_version) > version_components(runtime_version)
    }
}

fn version_components(version: &str) -> Vec<u64> {
    let mut parts: Vec<u64> = version
        .trim_start_matches('v')
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect();
    while parts.last() == Some(&0) {
        parts.pop();
    }
    parts
}

/// Hook functions, resolved once at load time.
#[derive(Debug, Clone)]
struct Hooks {
    available: Callable,
    pre_install: Callable,
    post_install: Option<Callable>,
    env_keys: Callable,
    pre_use: Option<Callable>,
}

impl Hooks {
    fn resolve(vm: &LuaVm, object: &ScriptObject) -> PluginResult<Self> {
        Ok(Self {
            available: required_hook(vm, object, AVAILABLE_HOOK)?,
            pre_install: required_hook(vm, object, PRE_INSTALL_HOOK)?,
            post_install: optional_hook(vm, object, POST_INSTALL_HOOK)?,
            env_keys: required_hook(vm, object, ENV_KEYS_HOOK)?,
            pre_use: optional_hook(vm, object, PRE_USE_HOOK)?,
        })
    }
}

fn optional_hook(vm: &LuaVm, object: &ScriptObject, name: &str) -> PluginResult<Option<Callable>> {
    vm.function(object, name)
        .map_err(|e| PluginError::Load(e.to_string()))
}

fn required_hook(vm: &LuaVm, object: &ScriptObject, name: &str) -> PluginResult<Callable> {
    optional_hook(vm, object, name)?
        .ok_or_else(|| PluginError::Load(format!("[{name}] function not found")))
}

/// A plugin loaded into its own Lua runtime.
///
/// Hook calls take `&mut self`; a plugin serves one caller at a time.
#[derive(Debug)]
pub struct LuaPlugin {
    descriptor: PluginDescriptor,
    vm: LuaVm,
    object: ScriptObject,
    hooks: Hooks,
    runtime_version: String,
}

impl LuaPlugin {
    /// Load a plugin from its source text.
    ///
    /// `path` names the source for error messages and provides the
    /// [`PluginDescriptor::filename`] alias.
    pub fn load(source: &str, path: impl AsRef<Path>, host: &HostConfig) -> PluginResult<Self> {
        let path = path.as_ref();

        let mut vm = LuaVm::new();
        vm.prepare(host)
            .map_err(|e| PluginError::Load(e.to_string()))?;
        vm.exec(source, &format!("@{}", path.display()))
            .map_err(|e| PluginError::Load(e.to_string()))?;

        let object = vm
            .global_object(PLUGIN_OBJECT)
            .map_err(|e| PluginError::Load(e.to_string()))?
            .ok_or_else(|| PluginError::Load("plugin object not found".to_string()))?;

        let hooks = Hooks::resolve(&vm, &object)?;

        let name = vm.get_string(&object, "name");
        if name.is_empty() {
            return Err(PluginError::Load("no plugin name provided".to_string()));
        }
        if !is_valid_name(&name) {
            return Err(PluginError::Load(format!("invalid plugin name '{name}'")));
        }

        let descriptor = PluginDescriptor {
            filepath: path.to_path_buf(),
            filename: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            name,
            author: vm.get_string(&object, "author"),
            version: vm.get_string(&object, "version"),
            description: vm.get_string(&object, "description"),
            update_url: vm.get_string(&object, "updateUrl"),
            min_runtime_version: vm.get_string(&object, "minRuntimeVersion"),
        };

        if descriptor.requires_newer_runtime(&host.runtime_version) {
            warn!(
                "plugin {} requires runtime {} or newer, running {}",
                descriptor.name, descriptor.min_runtime_version, host.runtime_version
            );
        }

        info!(
            "Loaded plugin: {} v{} from {:?}",
            descriptor.name, descriptor.version, descriptor.filepath
        );

        Ok(Self {
            descriptor,
            vm,
            object,
            hooks,
            runtime_version: host.runtime_version.clone(),
        })
    }

    /// Read and load a plugin file.
    pub fn from_file(path: impl AsRef<Path>, host: &HostConfig) -> PluginResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::load(&source, path, host)
    }

    /// Get the plugin's identity and metadata.
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Get the name the plugin declares.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Format `name@version` for this plugin's SDK.
    pub fn label(&self, version: impl fmt::Display) -> String {
        format!("{}@{}", self.descriptor.name, version)
    }

    /// Check whether the plugin defines a function under `name`.
    pub fn has_function(&self, name: &str) -> bool {
        match name {
            AVAILABLE_HOOK | PRE_INSTALL_HOOK | ENV_KEYS_HOOK => true,
            POST_INSTALL_HOOK => self.hooks.post_install.is_some(),
            PRE_USE_HOOK => self.hooks.pre_use.is_some(),
            other => self.vm.has_function(&self.object, other),
        }
    }

    /// List the versions the plugin can install.
    ///
    /// A hook returning nothing yields an empty list. Additional files
    /// without a name are skipped with a warning.
    pub fn available(&mut self) -> PluginResult<Vec<Package>> {
        let ctx = AvailableHookCtx {
            runtime_version: self.runtime_version.clone(),
        };
        let result = invoke(&mut self.vm, &self.object, &self.hooks.available, &ctx)?;
        let Some(list) = result_table(&result)? else {
            return Ok(Vec::new());
        };

        let name = &self.descriptor.name;
        let mut packages = Vec::new();
        for entry in sequence_tables(name, AVAILABLE_HOOK, list) {
            let mut item = AvailableHookResultItem::default();
            item.unmarshal(entry)?;

            let mut additions = Vec::new();
            if let Some(Value::Table(list)) = entry.as_table().and_then(|t| t.get_str("addition")) {
                for (i, addition) in sequence_tables(name, "addition", list).enumerate() {
                    let mut info = LuaSdkInfo::default();
                    info.unmarshal(addition)?;
                    if info.name.is_empty() {
                        warn!(
                            "{}: additional file {} of version {} has no name, skipped",
                            name,
                            i + 1,
                            item.version
                        );
                        continue;
                    }
                    additions.push(Info {
                        name: info.name,
                        version: Version::from(info.version),
                        path: info.path,
                        note: info.note,
                        checksum: Checksum::none(),
                    });
                }
            }

            packages.push(Package {
                main: Info {
                    name: name.clone(),
                    version: Version::from(item.version),
                    note: item.note,
                    ..Info::default()
                },
                additions,
            });
        }

        Ok(packages)
    }

    /// Resolve what to download for `version`.
    ///
    /// Returns `None` when the hook returns nothing. The main artifact must
    /// carry a version, and every entry of `addition` a name.
    pub fn pre_install(&mut self, version: &Version) -> PluginResult<Option<Package>> {
        let ctx = PreInstallHookCtx {
            version: version.to_string(),
            runtime_version: self.runtime_version.clone(),
        };
        let result = invoke(&mut self.vm, &self.object, &self.hooks.pre_install, &ctx)?;
        let Some(table) = result_table(&result)? else {
            return Ok(None);
        };

        let mut main = parse_info(&result)?;
        if main.version.is_empty() {
            return Err(HookContractError::MissingVersion.into());
        }
        main.name = self.descriptor.name.clone();

        let mut additions = Vec::new();
        if let Some(Value::Table(list)) = table.get_str("addition") {
            for entry in list.sequence_values() {
                let info = parse_info(entry)?;
                if info.name.is_empty() {
                    return Err(HookContractError::MissingName.into());
                }
                additions.push(info);
            }
        }

        debug!(
            "{} resolved {} with {} additional file(s)",
            self.descriptor.name,
            main.label(),
            additions.len()
        );

        Ok(Some(Package { main, additions }))
    }

    /// Let the plugin finish an installation under `root_path`.
    ///
    /// Succeeds without doing anything when the plugin has no `PostInstall`.
    pub fn post_install(&mut self, root_path: &Path, sdks: &[Info]) -> PluginResult<()> {
        let Some(hook) = &self.hooks.post_install else {
            return Ok(());
        };

        let ctx = PostInstallHookCtx {
            runtime_version: self.runtime_version.clone(),
            root_path: root_path.to_string_lossy().into_owned(),
            sdk_info: info_by_name(sdks.iter()),
        };
        invoke(&mut self.vm, &self.object, hook, &ctx)?;
        Ok(())
    }

    /// Ask the plugin which environment variables activate `package`.
    ///
    /// Later pairs overwrite earlier ones with the same key.
    pub fn env_keys(&mut self, package: &Package) -> PluginResult<Envs> {
        let main = &package.main;
        let ctx = EnvKeysHookCtx {
            path: main.path.clone(),
            runtime_version: self.runtime_version.clone(),
            main: LuaSdkInfo::from(main),
            sdk_info: info_by_name(package.additions.iter()),
        };
        let result = invoke(&mut self.vm, &self.object, &self.hooks.env_keys, &ctx)?;

        let Some(list) = result_table(&result)? else {
            return Err(HookContractError::NoEnvironmentVariables.into());
        };

        let mut envs = Envs::new();
        for entry in sequence_tables(&self.descriptor.name, ENV_KEYS_HOOK, list) {
            let mut item = EnvKeysHookResultItem::default();
            item.unmarshal(entry)?;
            if item.key.is_empty() {
                warn!("{}: environment variable without a key, skipped", self.descriptor.name);
                continue;
            }
            envs.insert(item.key, item.value);
        }
        if envs.is_empty() {
            return Err(HookContractError::NoEnvironmentVariables.into());
        }
        Ok(envs)
    }

    /// Let the plugin pick the version to use.
    ///
    /// Returns `None` when the plugin has no `PreUse`, or when the hook
    /// returns nothing or an empty version.
    pub fn pre_use(
        &mut self,
        version: &Version,
        previous_version: &Version,
        scope: UseScope,
        cwd: &Path,
        installed: &[Package],
    ) -> PluginResult<Option<Version>> {
        let Some(hook) = &self.hooks.pre_use else {
            return Ok(None);
        };

        let installed_sdks: BTreeMap<String, LuaSdkInfo> = installed
            .iter()
            .map(|package| (package.main.version.to_string(), LuaSdkInfo::from(&package.main)))
            .collect();

        let ctx = PreUseHookCtx {
            runtime_version: self.runtime_version.clone(),
            cwd: cwd.to_string_lossy().into_owned(),
            scope: scope.to_string(),
            version: version.to_string(),
            previous_version: previous_version.to_string(),
            installed_sdks,
        };
        debug!("PreUse context: {:?}", ctx);

        let result = invoke(&mut self.vm, &self.object, hook, &ctx)?;
        if result.is_nil() {
            return Ok(None);
        }

        let mut picked = PreUseHookResult::default();
        picked.unmarshal(&result)?;
        if picked.version.is_empty() {
            return Ok(None);
        }
        Ok(Some(Version::from(picked.version)))
    }

    /// Release the plugin's runtime.
    pub fn close(self) {
        debug!("Closing plugin: {}", self.descriptor.name);
        self.vm.close();
    }
}

/// Call `PLUGIN:hook(ctx)` and take what it returned.
fn invoke(
    vm: &mut LuaVm,
    object: &ScriptObject,
    hook: &Callable,
    ctx: &impl Marshal,
) -> Result<Value, RuntimeError> {
    let ctx = ctx.marshal()?;
    vm.call(hook, object, &[ctx])?;
    Ok(vm.returned_value())
}

/// Get the table a hook returned. `None` if it returned nothing.
fn result_table(result: &Value) -> PluginResult<Option<&Table>> {
    match result {
        Value::Nil => Ok(None),
        Value::Table(table) => Ok(Some(table)),
        other => Err(CodecError::UnsupportedType(other.type_name().to_string()).into()),
    }
}

/// Walk the sequence part of `list` the way `ipairs` does, skipping entries
/// that are not tables.
fn sequence_tables<'a>(
    plugin: &'a str,
    what: &'a str,
    list: &'a Table,
) -> impl Iterator<Item = &'a Value> + 'a {
    list.sequence_values().enumerate().filter_map(move |(i, entry)| {
        if entry.as_table().is_some() {
            Some(entry)
        } else {
            warn!(
                "{}: {} entry {} is a {}, skipped",
                plugin,
                what,
                i + 1,
                entry.type_name()
            );
            None
        }
    })
}

fn parse_info(value: &Value) -> PluginResult<Info> {
    let mut item = PreInstallHookResultItem::default();
    item.unmarshal(value)?;
    let path = item.location().to_string();
    Ok(Info {
        name: item.name,
        version: Version::from(item.version),
        path,
        note: item.note,
        checksum: Checksum::resolve(value),
    })
}

fn info_by_name<'a>(infos: impl Iterator<Item = &'a Info>) -> BTreeMap<String, LuaSdkInfo> {
    infos
        .map(|info| (info.name.clone(), LuaSdkInfo::from(info)))
        .collect()
}
