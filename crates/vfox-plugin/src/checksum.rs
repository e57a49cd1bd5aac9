//! Picking the checksum an install result declares.
//!
//! A result table may carry any of `sha256`, `md5`, `sha1` and `sha512`. The
//! first non-empty one in that order wins. Checksums are optional: a table
//! with none of them, or a value that is not a table, resolves to
//! [`Checksum::none`] instead of an error.

use crate::hooks::LuaChecksum;
use crate::sdk::{Checksum, ChecksumKind};
use tracing::debug;
use vfox_luai::{Unmarshal, Value};

impl Checksum {
    /// Resolve the checksum declared in a hook result table.
    pub fn resolve(value: &Value) -> Checksum {
        let mut declared = LuaChecksum::default();
        if let Err(e) = declared.unmarshal(value) {
            debug!("no checksum readable from {}: {}", value.type_name(), e);
            return Checksum::none();
        }

        let candidates = [
            (ChecksumKind::Sha256, declared.sha256),
            (ChecksumKind::Md5, declared.md5),
            (ChecksumKind::Sha1, declared.sha1),
            (ChecksumKind::Sha512, declared.sha512),
        ];

        candidates
            .into_iter()
            .find(|(_, value)| !value.is_empty())
            .map(|(kind, value)| Checksum::new(kind, value))
            .unwrap_or_else(Checksum::none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfox_luai::Table;

    fn table(entries: &[(&str, &str)]) -> Value {
        let mut table = Table::new();
        for (key, value) in entries {
            table.set(*key, *value);
        }
        Value::Table(table)
    }

    #[test]
    fn test_sha256_beats_md5() {
        let checksum = Checksum::resolve(&table(&[("md5", "m"), ("sha256", "s")]));
        assert_eq!(checksum, Checksum::new(ChecksumKind::Sha256, "s"));
    }

    #[test]
    fn test_priority_order() {
        let checksum = Checksum::resolve(&table(&[("sha512", "x"), ("sha1", "y")]));
        assert_eq!(checksum.kind, ChecksumKind::Sha1);
        assert_eq!(checksum.value, "y");

        let checksum = Checksum::resolve(&table(&[("sha512", "x")]));
        assert_eq!(checksum.kind, ChecksumKind::Sha512);
    }

    #[test]
    fn test_empty_fields_resolve_to_none() {
        let checksum = Checksum::resolve(&table(&[
            ("sha256", ""),
            ("md5", ""),
            ("sha1", ""),
            ("sha512", ""),
        ]));
        assert!(checksum.is_none());
        assert!(checksum.value.is_empty());
    }

    #[test]
    fn test_unreadable_value_resolves_to_none() {
        assert!(Checksum::resolve(&Value::from("sha256")).is_none());
        assert!(Checksum::resolve(&Value::Nil).is_none());
    }

    #[test]
    fn test_non_string_checksum_is_ignored() {
        let mut t = Table::new();
        t.set("sha256", 12_i64);
        t.set("md5", "abc");
        let checksum = Checksum::resolve(&Value::Table(t));
        assert_eq!(checksum, Checksum::new(ChecksumKind::Md5, "abc"));
    }
}
