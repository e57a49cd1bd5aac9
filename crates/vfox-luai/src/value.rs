//! The dynamic value tree exchanged with plugins.

use std::collections::BTreeMap;
use std::fmt;

/// A value as seen on the scripting side of the boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Nil,
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Integer(i64),
    /// Floating-point number.
    Number(f64),
    /// String value.
    String(String),
    /// Table holding records, maps and sequences alike.
    Table(Table),
}

impl Value {
    /// Name of the value's type, as the scripting runtime spells it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
        }
    }

    /// Check if this is `nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Borrow the table, if this value is one.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Borrow the string, if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Value::Table(table)
    }
}

/// A table key. Only integer and string keys cross the boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

/// A table: integer keys first in ascending order, then string keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    entries: BTreeMap<Key, Value>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence, keyed from 1.
    pub fn sequence<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let entries = (1..).map(Key::Int).zip(items).collect();
        Self { entries }
    }

    /// Set an entry. Setting `nil` removes the key.
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if value.is_nil() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, value);
        }
    }

    /// Get an entry by key.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get an entry by string key.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries.get(&Key::Str(key.to_string()))
    }

    /// Get a string field, if present and a string.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.get_str(key).and_then(Value::as_str)
    }

    /// Length of the sequence part: the number of consecutive integer keys
    /// starting at 1.
    pub fn len(&self) -> usize {
        let mut n = 0;
        while self.entries.contains_key(&Key::Int(n as i64 + 1)) {
            n += 1;
        }
        n
    }

    /// Check if the sequence part is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries of any key kind.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }

    /// Iterate over the sequence part in order.
    pub fn sequence_values(&self) -> impl Iterator<Item = &Value> {
        (1..=self.len() as i64).filter_map(move |i| self.entries.get(&Key::Int(i)))
    }
}

impl FromIterator<(Key, Value)> for Table {
    fn from_iter<T: IntoIterator<Item = (Key, Value)>>(iter: T) -> Self {
        let mut table = Table::new();
        for (key, value) in iter {
            table.set(key, value);
        }
        table
    }
}
