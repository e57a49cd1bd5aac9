//! Host data to [`Value`].
//!
//! Records get their implementation from [`crate::record!`]. Everything else
//! a hook context is built from (strings, numbers, booleans, sequences and
//! string-keyed maps) is covered here.

use crate::error::{CodecError, CodecResult};
use crate::value::{Key, Table, Value};
use std::collections::{BTreeMap, HashMap};

/// Conversion of host data into a [`Value`].
pub trait Marshal {
    fn marshal(&self) -> CodecResult<Value>;
}

impl<T: Marshal + ?Sized> Marshal for &T {
    fn marshal(&self) -> CodecResult<Value> {
        (**self).marshal()
    }
}

impl<T: Marshal + ?Sized> Marshal for Box<T> {
    fn marshal(&self) -> CodecResult<Value> {
        (**self).marshal()
    }
}

impl<T: Marshal> Marshal for Option<T> {
    fn marshal(&self) -> CodecResult<Value> {
        match self {
            Some(value) => value.marshal(),
            None => Ok(Value::Nil),
        }
    }
}

impl Marshal for str {
    fn marshal(&self) -> CodecResult<Value> {
        Ok(Value::String(self.to_string()))
    }
}

impl Marshal for String {
    fn marshal(&self) -> CodecResult<Value> {
        Ok(Value::String(self.clone()))
    }
}

impl Marshal for bool {
    fn marshal(&self) -> CodecResult<Value> {
        Ok(Value::Boolean(*self))
    }
}

macro_rules! marshal_lossless_int {
    ($($ty:ty),*) => {
        $(
            impl Marshal for $ty {
                fn marshal(&self) -> CodecResult<Value> {
                    Ok(Value::Integer(i64::from(*self)))
                }
            }
        )*
    };
}

marshal_lossless_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! marshal_wide_int {
    ($($ty:ty),*) => {
        $(
            impl Marshal for $ty {
                fn marshal(&self) -> CodecResult<Value> {
                    i64::try_from(*self).map(Value::Integer).map_err(|_| {
                        CodecError::unsupported(format!(
                            "{} value {} does not fit a 64-bit signed integer",
                            stringify!($ty),
                            self
                        ))
                    })
                }
            }
        )*
    };
}

marshal_wide_int!(u64, usize, isize, i128, u128);

impl Marshal for f32 {
    fn marshal(&self) -> CodecResult<Value> {
        Ok(Value::Number(f64::from(*self)))
    }
}

impl Marshal for f64 {
    fn marshal(&self) -> CodecResult<Value> {
        Ok(Value::Number(*self))
    }
}

impl<T: Marshal> Marshal for [T] {
    fn marshal(&self) -> CodecResult<Value> {
        let items = self
            .iter()
            .map(Marshal::marshal)
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(Value::Table(Table::sequence(items)))
    }
}

impl<T: Marshal, const N: usize> Marshal for [T; N] {
    fn marshal(&self) -> CodecResult<Value> {
        self.as_slice().marshal()
    }
}

impl<T: Marshal> Marshal for Vec<T> {
    fn marshal(&self) -> CodecResult<Value> {
        self.as_slice().marshal()
    }
}

fn marshal_entries<'a, K, V, I>(entries: I) -> CodecResult<Value>
where
    K: AsRef<str> + 'a,
    V: Marshal + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let mut table = Table::new();
    for (key, value) in entries {
        table.set(Key::Str(key.as_ref().to_string()), value.marshal()?);
    }
    Ok(Value::Table(table))
}

impl<K: AsRef<str>, V: Marshal, S> Marshal for HashMap<K, V, S> {
    fn marshal(&self) -> CodecResult<Value> {
        marshal_entries(self.iter())
    }
}

impl<K: AsRef<str>, V: Marshal> Marshal for BTreeMap<K, V> {
    fn marshal(&self) -> CodecResult<Value> {
        marshal_entries(self.iter())
    }
}
