//! # vfox-plugin
//!
//! Lua plugins for the vfox SDK version manager.
//!
//! This crate provides:
//! - [`LuaPlugin`], which loads a plugin, validates its contract and drives
//!   its lifecycle hooks
//! - The SDK domain types hooks produce: [`Package`], [`Info`], [`Checksum`]
//! - The hook contexts and results exchanged with plugins
//! - Discovery of plugin files in a directory
//!
//! ## Plugin Contract
//!
//! A plugin is a Lua source file that fills the global `PLUGIN` table with
//! string metadata (`name`, `version`, `description`, `updateUrl`, `author`,
//! `minRuntimeVersion`) and hook functions:
//!
//! | Hook | Required | Called by |
//! |------|----------|-----------|
//! | `Available` | yes | [`LuaPlugin::available`] |
//! | `PreInstall` | yes | [`LuaPlugin::pre_install`] |
//! | `EnvKeys` | yes | [`LuaPlugin::env_keys`] |
//! | `PostInstall` | no | [`LuaPlugin::post_install`] |
//! | `PreUse` | no | [`LuaPlugin::pre_use`] |
//!
//! Hooks are called as `PLUGIN:Hook(ctx)` and may return a single value.

pub mod checksum;
pub mod discovery;
pub mod error;
pub mod hooks;
pub mod plugin;
pub mod sdk;

pub use discovery::{discover_plugins, PluginSource};
pub use error::{HookContractError, PluginError, PluginResult};
pub use plugin::{is_valid_name, LuaPlugin, PluginDescriptor};
pub use sdk::{Checksum, ChecksumKind, Envs, Info, Package, UseScope, Version};
