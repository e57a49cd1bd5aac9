//! [`Value`] back into host data.
//!
//! [`Unmarshal`] is the entry point and only accepts tables. [`Assign`] is the
//! per-field step: it coerces by the type found in the table and reports
//! whether anything was written. A field that cannot take the value is left
//! untouched.

use crate::error::{CodecError, CodecResult};
use crate::value::{Key, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use tracing::trace;

/// Largest sequence index a growable target will extend itself to.
const MAX_SEQUENCE_INDEX: usize = 1 << 16;

/// Fill `self` from a table.
pub trait Unmarshal {
    fn unmarshal(&mut self, value: &Value) -> CodecResult<()>;
}

/// Write a single table entry into a field.
pub trait Assign {
    /// Returns `false` when the value's type does not fit the field.
    fn assign(&mut self, value: &Value) -> bool;
}

impl Assign for String {
    fn assign(&mut self, value: &Value) -> bool {
        match value {
            Value::String(s) => {
                self.clone_from(s);
                true
            }
            _ => false,
        }
    }
}

impl Assign for bool {
    fn assign(&mut self, value: &Value) -> bool {
        match value {
            Value::Boolean(b) => {
                *self = *b;
                true
            }
            _ => false,
        }
    }
}

macro_rules! assign_int {
    ($($ty:ty),*) => {
        $(
            impl Assign for $ty {
                fn assign(&mut self, value: &Value) -> bool {
                    let n = match value {
                        Value::Integer(n) => *n,
                        Value::Number(n) => *n as i64,
                        _ => return false,
                    };
                    match <$ty>::try_from(n) {
                        Ok(n) => {
                            *self = n;
                            true
                        }
                        Err(_) => false,
                    }
                }
            }
        )*
    };
}

assign_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: Assign + Default> Assign for Option<T> {
    fn assign(&mut self, value: &Value) -> bool {
        if value.is_nil() {
            return false;
        }
        let mut inner = T::default();
        if inner.assign(value) {
            *self = Some(inner);
            true
        } else {
            false
        }
    }
}

impl<T: Assign + Default> Unmarshal for Vec<T> {
    fn unmarshal(&mut self, value: &Value) -> CodecResult<()> {
        let table = value
            .as_table()
            .ok_or_else(|| CodecError::unsupported(value.type_name()))?;

        for (key, entry) in table.iter() {
            let index = match key {
                Key::Int(i) if *i >= 1 && (*i as usize) <= MAX_SEQUENCE_INDEX => (*i - 1) as usize,
                _ => {
                    trace!("unmarshal: skipping key {} on a sequence", key);
                    continue;
                }
            };
            if index >= self.len() {
                self.resize_with(index + 1, T::default);
            }
            if !self[index].assign(entry) {
                trace!("unmarshal: element {} has unexpected type {}", key, entry.type_name());
            }
        }
        Ok(())
    }
}

impl<T: Assign + Default> Assign for Vec<T> {
    fn assign(&mut self, value: &Value) -> bool {
        self.unmarshal(value).is_ok()
    }
}

impl<T: Assign, const N: usize> Unmarshal for [T; N] {
    fn unmarshal(&mut self, value: &Value) -> CodecResult<()> {
        let table = value
            .as_table()
            .ok_or_else(|| CodecError::unsupported(value.type_name()))?;

        for (key, entry) in table.iter() {
            let slot = match key {
                Key::Int(i) if *i >= 1 => self.get_mut((*i - 1) as usize),
                _ => None,
            };
            match slot {
                Some(slot) => {
                    slot.assign(entry);
                }
                None => trace!("unmarshal: key {} outside array of length {}", key, N),
            }
        }
        Ok(())
    }
}

impl<T: Assign, const N: usize> Assign for [T; N] {
    fn assign(&mut self, value: &Value) -> bool {
        self.unmarshal(value).is_ok()
    }
}

/// Collect the string-keyed entries of a table that `T` accepts.
fn assign_entries<T, F>(value: &Value, mut insert: F) -> bool
where
    T: Assign + Default,
    F: FnMut(String, T),
{
    let Some(table) = value.as_table() else {
        return false;
    };
    for (key, entry) in table.iter() {
        let Key::Str(key) = key else {
            continue;
        };
        let mut item = T::default();
        if item.assign(entry) {
            insert(key.clone(), item);
        }
    }
    true
}

impl<K, T, S> Assign for HashMap<K, T, S>
where
    K: From<String> + Eq + Hash,
    T: Assign + Default,
    S: BuildHasher,
{
    fn assign(&mut self, value: &Value) -> bool {
        assign_entries(value, |key, item: T| {
            self.insert(K::from(key), item);
        })
    }
}

impl<K, T> Assign for BTreeMap<K, T>
where
    K: From<String> + Ord,
    T: Assign + Default,
{
    fn assign(&mut self, value: &Value) -> bool {
        assign_entries(value, |key, item: T| {
            self.insert(K::from(key), item);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Table;

    #[test]
    fn test_number_truncates_into_integer() {
        let mut n = 0i64;
        assert!(n.assign(&Value::Number(1.9)));
        assert_eq!(n, 1);
    }

    #[test]
    fn test_mismatched_type_is_skipped() {
        let mut s = "keep".to_string();
        assert!(!s.assign(&Value::Integer(3)));
        assert_eq!(s, "keep");
    }

    #[test]
    fn test_integer_out_of_range_is_skipped() {
        let mut n = 5u8;
        assert!(!n.assign(&Value::Integer(300)));
        assert_eq!(n, 5);
    }

    #[test]
    fn test_vec_positional() {
        let table = Table::sequence(vec![Value::from("a"), Value::from("b")]);
        let mut items: Vec<String> = Vec::new();
        items.unmarshal(&Value::Table(table)).unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_fixed_array_ignores_out_of_range() {
        let table = Table::sequence(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]);
        let mut items = [0i64; 2];
        items.unmarshal(&Value::Table(table)).unwrap();
        assert_eq!(items, [1, 2]);
    }

    #[test]
    fn test_non_table_is_rejected() {
        let mut items: Vec<String> = Vec::new();
        let err = items.unmarshal(&Value::from("nope")).unwrap_err();
        assert_eq!(err, CodecError::UnsupportedType("string".to_string()));
    }

    #[test]
    fn test_map_takes_string_keys() {
        let mut table = Table::new();
        table.set("a", "1");
        table.set("b", 2_i64);
        table.set(1_i64, "seq");
        let mut map: HashMap<String, String> = HashMap::new();
        assert!(map.assign(&Value::Table(table)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_option_stays_none_on_mismatch() {
        let mut value: Option<String> = None;
        assert!(!value.assign(&Value::Boolean(true)));
        assert!(value.is_none());
        assert!(value.assign(&Value::from("x")));
        assert_eq!(value.as_deref(), Some("x"));
    }
}
