//! Key canonicalization.
//!
//! Config sources spell keys however their authors like: `pool-size`,
//! `poolSize`, `PoolSize`. Struct fields are snake_case, so every key read
//! from a file is converted before it reaches deserialization.

use heck::ToSnakeCase;
use toml::{Table, Value};

use crate::error::InifigError;

/// Converts one symbol to snake_case.
///
/// Word boundaries are any non-alphanumeric character, a lower-to-upper
/// transition (`poolSize`) and the last capital of an acronym run
/// (`HTTPServer`).
pub fn canonical_symbol(symbol: &str) -> String {
    symbol.to_snake_case()
}

/// Canonicalizes a path of symbols.
pub fn canonical<S: AsRef<str>>(path: &[S]) -> Vec<String> {
    path.iter().map(|s| canonical_symbol(s.as_ref())).collect()
}

/// Rewrites every key of `table`, recursively, into canonical form.
///
/// Fails when two keys of the same table collapse onto one canonical key;
/// `path` is the dotted prefix used in that error.
pub fn canonicalize_table(table: Table, path: &str) -> Result<Table, InifigError> {
    let mut out = Table::new();
    for (key, value) in table {
        let canonical = canonical_symbol(&key);
        let dotted = if path.is_empty() {
            canonical.clone()
        } else {
            format!("{path}.{canonical}")
        };
        if out.contains_key(&canonical) {
            return Err(InifigError::ConflictingKeys { key: dotted });
        }
        let value = canonicalize_value(value, &dotted)?;
        out.insert(canonical, value);
    }
    Ok(out)
}

fn canonicalize_value(value: Value, path: &str) -> Result<Value, InifigError> {
    match value {
        Value::Table(table) => canonicalize_table(table, path).map(Value::Table),
        Value::Array(items) => items
            .into_iter()
            .map(|item| canonicalize_value(item, path))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_spellings_agree() {
        for spelling in ["pool_size", "pool-size", "poolSize", "PoolSize", "POOL_SIZE"] {
            assert_eq!(canonical_symbol(spelling), "pool_size", "{spelling}");
        }
    }

    #[test]
    fn acronyms_split_before_last_capital() {
        assert_eq!(canonical_symbol("HTTPServer"), "http_server");
        assert_eq!(canonical_symbol("serverURL"), "server_url");
        assert_eq!(canonical_symbol("ID"), "id");
    }

    #[test]
    fn digits_and_separators() {
        assert_eq!(canonical_symbol("ipv4Address"), "ipv4_address");
        assert_eq!(canonical_symbol("a--b"), "a_b");
        assert_eq!(canonical_symbol("-leading"), "leading");
        assert_eq!(canonical_symbol("host"), "host");
    }

    #[test]
    fn path_is_canonicalized_per_symbol() {
        assert_eq!(canonical(&["Database", "poolSize"]), ["database", "pool_size"]);
    }

    #[test]
    fn table_keys_rewritten_recursively() {
        let table: Table = toml::from_str("[Database]\npool-size = 3\n").unwrap();
        let table = canonicalize_table(table, "").unwrap();
        assert_eq!(table["database"]["pool_size"].as_integer(), Some(3));
    }

    #[test]
    fn conflicting_spellings_rejected() {
        let table: Table = toml::from_str("[db]\npool-size = 3\npoolSize = 4\n").unwrap();
        match canonicalize_table(table, "") {
            Err(InifigError::ConflictingKeys { key }) => assert_eq!(key, "db.pool_size"),
            other => panic!("Expected ConflictingKeys, got {other:?}"),
        }
    }
}
