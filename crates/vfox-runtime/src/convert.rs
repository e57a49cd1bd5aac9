//! Conversion between [`vfox_luai::Value`] and interpreter values.

use mlua::Lua;
use std::collections::HashSet;
use std::ffi::c_void;
use tracing::{trace, warn};
use vfox_luai::{Key, Table, Value};

/// Tables nested deeper than this are cut off when read back.
const MAX_DEPTH: usize = 64;

/// Most values read back from a single result. Shared subtables count once
/// per occurrence, so this bounds results that fan out into the same tables.
const MAX_NODES: usize = 100_000;

/// Build an interpreter value from a codec value.
pub(crate) fn to_lua(lua: &Lua, value: &Value) -> mlua::Result<mlua::Value> {
    Ok(match value {
        Value::Nil => mlua::Value::Nil,
        Value::Boolean(b) => mlua::Value::Boolean(*b),
        Value::Integer(n) => mlua::Value::Integer(*n),
        Value::Number(n) => mlua::Value::Number(*n),
        Value::String(s) => mlua::Value::String(lua.create_string(s)?),
        Value::Table(table) => {
            let out = lua.create_table()?;
            for (key, entry) in table.iter() {
                let entry = to_lua(lua, entry)?;
                match key {
                    Key::Int(i) => out.raw_set(*i, entry)?,
                    Key::Str(s) => out.raw_set(s.as_str(), entry)?,
                }
            }
            mlua::Value::Table(out)
        }
    })
}

/// Read an interpreter value into a codec value.
///
/// Functions, threads and userdata have no codec counterpart and read as
/// `Nil`, so they disappear from the tables that contain them. A table that
/// contains itself, directly or further down, reads as `Nil` where it
/// recurs.
pub(crate) fn from_lua(value: &mlua::Value) -> Value {
    Reader::default().read(value)
}

#[derive(Default)]
struct Reader {
    /// Tables between the root and the value being read.
    path: HashSet<*const c_void>,
    nodes: usize,
    exhausted: bool,
}

impl Reader {
    fn read(&mut self, value: &mlua::Value) -> Value {
        if self.nodes >= MAX_NODES {
            if !self.exhausted {
                warn!("result holds more than {} values, truncated", MAX_NODES);
                self.exhausted = true;
            }
            return Value::Nil;
        }
        self.nodes += 1;

        match value {
            mlua::Value::Nil => Value::Nil,
            mlua::Value::Boolean(b) => Value::Boolean(*b),
            mlua::Value::Integer(n) => Value::Integer(*n),
            mlua::Value::Number(n) => Value::Number(*n),
            mlua::Value::String(s) => Value::String(s.to_string_lossy().into()),
            mlua::Value::Table(table) => self.read_table(table),
            other => {
                trace!("skipping {} value", other.type_name());
                Value::Nil
            }
        }
    }

    fn read_table(&mut self, table: &mlua::Table) -> Value {
        if self.path.len() >= MAX_DEPTH {
            warn!("table nested deeper than {} levels, truncated", MAX_DEPTH);
            return Value::Nil;
        }
        let id = table.to_pointer();
        if !self.path.insert(id) {
            trace!("skipping table that contains itself");
            return Value::Nil;
        }

        let mut out = Table::new();
        for pair in table.pairs::<mlua::Value, mlua::Value>() {
            let (key, entry) = match pair {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("failed to read table entry: {}", e);
                    continue;
                }
            };
            match table_key(&key) {
                Some(key) => {
                    let entry = self.read(&entry);
                    out.set(key, entry);
                }
                None => trace!("skipping {} key", key.type_name()),
            }
        }

        self.path.remove(&id);
        Value::Table(out)
    }
}

fn table_key(key: &mlua::Value) -> Option<Key> {
    match key {
        mlua::Value::Integer(i) => Some(Key::Int(*i)),
        mlua::Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(Key::Int(*n as i64)),
        mlua::Value::String(s) => Some(Key::Str(s.to_string_lossy().into())),
        _ => None,
    }
}
