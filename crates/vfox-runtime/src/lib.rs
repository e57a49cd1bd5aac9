//! # vfox-runtime
//!
//! The Lua runtime that vfox plugins execute in.
//!
//! This crate provides:
//! - [`LuaVm`], one interpreter per plugin, with protected calls and an
//!   optional per-call deadline
//! - [`HostConfig`], the host settings a plugin can observe
//! - The preload helper library and the `host` module
//! - Conversion between [`vfox_luai::Value`] and interpreter values
//!
//! Nothing outside this crate touches the interpreter directly. Plugins are
//! addressed through the opaque [`ScriptObject`] and [`Callable`] handles.

mod convert;
pub mod error;
pub mod host;
pub mod platform;
pub mod vm;

pub use error::{RuntimeError, RuntimeResult};
pub use host::HostConfig;
pub use vm::{Callable, LuaVm, ScriptObject, ARCH_TYPE, OS_TYPE};
