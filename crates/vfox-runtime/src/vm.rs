//! One interpreter per plugin.
//!
//! A [`LuaVm`] is prepared once with the host configuration, runs the plugin
//! source, and is then driven through protected calls. The result of the
//! last call is held until [`LuaVm::returned_value`] takes it.

use crate::convert;
use crate::error::{RuntimeError, RuntimeResult};
use crate::host::{self, HostConfig};
use mlua::{HookTriggers, Lua, VmState};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::debug;
use vfox_luai::Value;

/// Global holding the operating system identifier.
pub const OS_TYPE: &str = "OS_TYPE";

/// Global holding the CPU architecture identifier.
pub const ARCH_TYPE: &str = "ARCH_TYPE";

const PRELOAD: &str = include_str!("preload.lua");

/// How many VM instructions run between two deadline checks.
const DEADLINE_CHECK_INTERVAL: u32 = 10_000;

/// A table living inside a [`LuaVm`].
#[derive(Debug, Clone)]
pub struct ScriptObject {
    table: mlua::Table,
}

/// A function resolved from a [`ScriptObject`], remembered with its name.
#[derive(Debug, Clone)]
pub struct Callable {
    name: String,
    function: mlua::Function,
}

impl Callable {
    /// Name the function was resolved under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A Lua interpreter hosting a single plugin.
///
/// Not safe for concurrent use; calls take `&mut self`.
pub struct LuaVm {
    lua: Lua,
    hook_timeout: Option<Duration>,
    returned: Option<mlua::Value>,
}

impl LuaVm {
    /// Create a bare interpreter with the standard libraries loaded.
    pub fn new() -> Self {
        Self {
            lua: Lua::new(),
            hook_timeout: None,
            returned: None,
        }
    }

    /// Install what every plugin expects before its source runs: the preload
    /// helpers, the `host` module and the read-only platform globals.
    pub fn prepare(&mut self, config: &HostConfig) -> RuntimeResult<()> {
        self.exec(PRELOAD, "preload")?;
        host::install_host_module(&self.lua, config)?;
        self.install_platform_globals(config)?;
        self.hook_timeout = config.hook_timeout;
        debug!(
            os = %config.os_type,
            arch = %config.arch_type,
            "prepared plugin runtime"
        );
        Ok(())
    }

    fn install_platform_globals(&self, config: &HostConfig) -> mlua::Result<()> {
        let fixed = self.lua.create_table()?;
        fixed.set(OS_TYPE, config.os_type.as_str())?;
        fixed.set(ARCH_TYPE, config.arch_type.as_str())?;

        let guard = self.lua.create_function(
            |_, (globals, key, value): (mlua::Table, mlua::Value, mlua::Value)| {
                if let mlua::Value::String(name) = &key {
                    if *name == OS_TYPE || *name == ARCH_TYPE {
                        return Err(mlua::Error::RuntimeError(format!(
                            "{} is read-only",
                            name.to_string_lossy()
                        )));
                    }
                }
                globals.raw_set(key, value)
            },
        )?;

        let meta = self.lua.create_table()?;
        meta.set("__index", fixed)?;
        meta.set("__newindex", guard)?;
        self.lua.globals().set_metatable(Some(meta));
        Ok(())
    }

    /// Run a chunk of source.
    ///
    /// Once prepared with a hook timeout, the chunk runs under the same
    /// deadline as calls and fails with [`RuntimeError::Timeout`] past it.
    pub fn exec(&self, source: &str, chunk_name: &str) -> RuntimeResult<()> {
        self.guarded(chunk_name, || self.lua.load(source).set_name(chunk_name).exec())
            .map_err(|e| match e {
                RuntimeError::Invocation { message, .. } => RuntimeError::Lua(message),
                other => other,
            })
    }

    /// Look up a global table. `None` if the global is unset.
    pub fn global_object(&self, name: &str) -> RuntimeResult<Option<ScriptObject>> {
        match self.lua.globals().get::<mlua::Value>(name)? {
            mlua::Value::Nil => Ok(None),
            mlua::Value::Table(table) => Ok(Some(ScriptObject { table })),
            other => Err(RuntimeError::UnexpectedType {
                name: name.to_string(),
                expected: "table",
                found: other.type_name(),
            }),
        }
    }

    /// Resolve a function stored on an object. `None` if the field is unset.
    pub fn function(&self, object: &ScriptObject, name: &str) -> RuntimeResult<Option<Callable>> {
        match object.table.raw_get::<mlua::Value>(name)? {
            mlua::Value::Nil => Ok(None),
            mlua::Value::Function(function) => Ok(Some(Callable {
                name: name.to_string(),
                function,
            })),
            other => Err(RuntimeError::UnexpectedType {
                name: name.to_string(),
                expected: "function",
                found: other.type_name(),
            }),
        }
    }

    /// Check whether an object holds a function under `name`.
    pub fn has_function(&self, object: &ScriptObject, name: &str) -> bool {
        matches!(
            object.table.raw_get::<mlua::Value>(name),
            Ok(mlua::Value::Function(_))
        )
    }

    /// Read a field as a string. Numbers are formatted; anything else,
    /// including a missing field, reads as the empty string.
    pub fn get_string(&self, object: &ScriptObject, key: &str) -> String {
        match object.table.raw_get::<mlua::Value>(key) {
            Ok(mlua::Value::String(s)) => s.to_string_lossy().into(),
            Ok(mlua::Value::Integer(n)) => n.to_string(),
            Ok(mlua::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Call `callable` as a method of `receiver` in protected mode, keeping
    /// its first result for [`LuaVm::returned_value`].
    ///
    /// Errors raised by the script come back as
    /// [`RuntimeError::Invocation`]; a call interrupted by the deadline comes
    /// back as [`RuntimeError::Timeout`].
    pub fn call(
        &mut self,
        callable: &Callable,
        receiver: &ScriptObject,
        args: &[Value],
    ) -> RuntimeResult<()> {
        self.returned = None;

        let mut values = Vec::with_capacity(args.len() + 1);
        values.push(mlua::Value::Table(receiver.table.clone()));
        for arg in args {
            values.push(convert::to_lua(&self.lua, arg)?);
        }

        debug!(function = %callable.name, "calling plugin function");

        let values: mlua::MultiValue = values.into_iter().collect();
        let value = self.guarded(&callable.name, || {
            callable.function.call::<mlua::Value>(values)
        })?;
        self.returned = Some(value);
        Ok(())
    }

    /// Run `f` under the configured deadline. Script errors come back as
    /// [`RuntimeError::Invocation`] and an expired deadline as
    /// [`RuntimeError::Timeout`], both under `name`.
    fn guarded<T>(&self, name: &str, f: impl FnOnce() -> mlua::Result<T>) -> RuntimeResult<T> {
        let expired = self.arm_deadline();
        let result = f();
        if expired.is_some() {
            self.lua.remove_hook();
        }

        result.map_err(|e| match (expired, self.hook_timeout) {
            (Some(expired), Some(timeout)) if expired.get() => RuntimeError::Timeout {
                function: name.to_string(),
                timeout,
            },
            _ => RuntimeError::Invocation {
                function: name.to_string(),
                message: e.to_string(),
            },
        })
    }

    /// Install an instruction hook that aborts the running call once the
    /// configured deadline passes. Returns the flag the hook raises.
    fn arm_deadline(&self) -> Option<Rc<Cell<bool>>> {
        let timeout = self.hook_timeout?;
        let deadline = Instant::now() + timeout;
        let expired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&expired);

        self.lua.set_hook(
            HookTriggers::new().every_nth_instruction(DEADLINE_CHECK_INTERVAL),
            move |_, _| {
                if Instant::now() >= deadline {
                    flag.set(true);
                    Err(mlua::Error::RuntimeError("hook deadline exceeded".to_string()))
                } else {
                    Ok(VmState::Continue)
                }
            },
        );
        Some(expired)
    }

    /// Take the result of the last call. `Nil` if the call returned nothing
    /// or the result was already taken.
    pub fn returned_value(&mut self) -> Value {
        self.returned
            .take()
            .map(|value| convert::from_lua(&value))
            .unwrap_or_default()
    }

    /// Release the interpreter.
    pub fn close(self) {
        debug!("closing plugin runtime");
        drop(self);
    }
}

impl Default for LuaVm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LuaVm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuaVm")
            .field("hook_timeout", &self.hook_timeout)
            .field("has_returned", &self.returned.is_some())
            .finish()
    }
}
