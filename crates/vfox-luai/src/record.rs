//! Declarative records.
//!
//! The field list doubles as the mapping table between struct fields and
//! table keys, so hook contexts and results are described once:
//!
//! ```
//! vfox_luai::record! {
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct Item {
//!         pub version: String as "version",
//!         pub note: String,
//!     }
//! }
//! ```
//!
//! Marshal writes each field under its tag, or under the field name when no
//! tag is given. Unmarshal looks a string key up among the field names first
//! and among the tags second; unknown keys and integer keys are skipped.

/// Declare a struct and derive [`Marshal`](crate::Marshal),
/// [`Unmarshal`](crate::Unmarshal) and [`Assign`](crate::Assign) for it.
#[macro_export]
macro_rules! record {
    (@key $field:ident) => {
        stringify!($field)
    };
    (@key $field:ident $tag:literal) => {
        $tag
    };
    (@tag_matches $key:ident) => {
        false
    };
    (@tag_matches $key:ident $tag:literal) => {
        $key == $tag
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(as $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Marshal for $name {
            fn marshal(&self) -> $crate::CodecResult<$crate::Value> {
                let mut table = $crate::Table::new();
                $(
                    table.set(
                        $crate::record!(@key $field $($tag)?),
                        $crate::Marshal::marshal(&self.$field)?,
                    );
                )*
                Ok($crate::Value::Table(table))
            }
        }

        impl $crate::Unmarshal for $name {
            #[allow(unused_variables)]
            fn unmarshal(&mut self, value: &$crate::Value) -> $crate::CodecResult<()> {
                let table = value
                    .as_table()
                    .ok_or_else(|| $crate::CodecError::unsupported(value.type_name()))?;

                for (key, entry) in table.iter() {
                    let key = match key {
                        $crate::Key::Str(key) => key.as_str(),
                        $crate::Key::Int(_) => continue,
                    };

                    let matched = $(
                        if key == stringify!($field) {
                            Some($crate::Assign::assign(&mut self.$field, entry))
                        } else
                    )* {
                        None
                    };
                    let matched = matched.or_else(|| $(
                        if $crate::record!(@tag_matches key $($tag)?) {
                            Some($crate::Assign::assign(&mut self.$field, entry))
                        } else
                    )* {
                        None
                    });

                    match matched {
                        Some(true) => {}
                        Some(false) => $crate::__tracing::trace!(
                            "unmarshal: {}.{} cannot take a {}",
                            stringify!($name),
                            key,
                            entry.type_name()
                        ),
                        None => $crate::__tracing::trace!(
                            "unmarshal: {} has no field for key {}",
                            stringify!($name),
                            key
                        ),
                    }
                }
                Ok(())
            }
        }

        impl $crate::Assign for $name {
            fn assign(&mut self, value: &$crate::Value) -> bool {
                $crate::Unmarshal::unmarshal(self, value).is_ok()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{CodecError, Key, Marshal, Table, Unmarshal, Value};
    use std::collections::{BTreeMap, HashMap};

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Plain {
            field1: String,
            field2: i64,
            field3: bool,
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Tagged {
            field_one: String as "fieldOne",
            field_two: i64 as "fieldTwo",
            field_three: bool as "fieldThree",
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Nested {
            name: String as "name",
            inner: Tagged as "inner",
            list: Vec<Tagged> as "list",
            tags: Vec<String> as "tags",
        }
    }

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct WithMap {
            entries: HashMap<String, Plain> as "entries",
            ordered: BTreeMap<String, Tagged> as "ordered",
        }
    }

    fn tagged(n: i64) -> Tagged {
        Tagged {
            field_one: format!("v{n}"),
            field_two: n,
            field_three: n % 2 == 0,
        }
    }

    #[test]
    fn test_plain_round_trip() {
        let original = Plain {
            field1: "test".to_string(),
            field2: 1,
            field3: true,
        };

        let value = original.marshal().unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.string("field1"), Some("test"));
        assert_eq!(table.get_str("field2"), Some(&Value::Integer(1)));
        assert_eq!(table.get_str("field3"), Some(&Value::Boolean(true)));

        let mut decoded = Plain::default();
        decoded.unmarshal(&value).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_tags_replace_field_names() {
        let value = tagged(2).marshal().unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.string("fieldOne"), Some("v2"));
        assert!(table.get_str("field_one").is_none());

        let mut decoded = Tagged::default();
        decoded.unmarshal(&value).unwrap();
        assert_eq!(decoded, tagged(2));
    }

    #[test]
    fn test_field_name_matches_before_tag() {
        let mut table = Table::new();
        table.set("field_one", "by-name");
        let mut decoded = Tagged::default();
        decoded.unmarshal(&Value::Table(table)).unwrap();
        assert_eq!(decoded.field_one, "by-name");
    }

    #[test]
    fn test_nested_round_trip() {
        let original = Nested {
            name: "jdk".to_string(),
            inner: tagged(1),
            list: vec![tagged(2), tagged(3)],
            tags: vec!["lts".to_string(), "ga".to_string()],
        };

        let value = original.marshal().unwrap();
        let list = value.as_table().unwrap().get_str("list").unwrap();
        assert_eq!(list.as_table().unwrap().len(), 2);

        let mut decoded = Nested::default();
        decoded.unmarshal(&value).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_unknown_keys_leave_fields_untouched() {
        let mut table = Table::new();
        table.set("unknown", "x");
        table.set("field2", 9_i64);
        table.set(1_i64, "positional");

        let mut decoded = Plain {
            field1: "keep".to_string(),
            field2: 0,
            field3: true,
        };
        decoded.unmarshal(&Value::Table(table)).unwrap();

        assert_eq!(decoded.field1, "keep");
        assert_eq!(decoded.field2, 9);
        assert!(decoded.field3);
    }

    #[test]
    fn test_coercion_follows_source_type() {
        let mut table = Table::new();
        table.set("field1", 12_i64);
        table.set("field2", Value::Number(3.7));
        table.set("field3", "true");

        let mut decoded = Plain::default();
        decoded.unmarshal(&Value::Table(table)).unwrap();

        assert_eq!(decoded.field1, "");
        assert_eq!(decoded.field2, 3);
        assert!(!decoded.field3);
    }

    #[test]
    fn test_record_rejects_non_table() {
        let mut decoded = Plain::default();
        let err = decoded.unmarshal(&Value::Integer(1)).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType(_)));
    }

    #[test]
    fn test_map_field_marshals_by_key() {
        let mut entries = HashMap::new();
        entries.insert(
            "main".to_string(),
            Plain {
                field1: "a".to_string(),
                ..Default::default()
            },
        );
        let value = WithMap {
            entries,
            ..Default::default()
        }
        .marshal()
        .unwrap();
        let entries = value.as_table().unwrap().get_str("entries").unwrap();
        let main = entries.as_table().unwrap().get(&Key::from("main")).unwrap();
        assert_eq!(main.as_table().unwrap().string("field1"), Some("a"));
    }

    #[test]
    fn test_map_fields_round_trip() {
        let mut entries = HashMap::new();
        entries.insert(
            "main".to_string(),
            Plain {
                field1: "a".to_string(),
                field2: 1,
                field3: true,
            },
        );
        entries.insert("empty".to_string(), Plain::default());

        let mut ordered = BTreeMap::new();
        ordered.insert("jdk".to_string(), tagged(4));
        ordered.insert("jmc".to_string(), tagged(5));

        let original = WithMap { entries, ordered };
        let value = original.marshal().unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.get_str("ordered").unwrap().as_table().unwrap().entry_count(), 2);

        let mut decoded = WithMap::default();
        decoded.unmarshal(&value).unwrap();
        assert_eq!(decoded, original);
    }
}
