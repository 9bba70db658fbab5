//! Programmatic overrides, the highest priority layer.
//!
//! Each `("database.url", Value)` pair is expanded into the nested table
//! structure needed for deep-merge with the file and environment layers.

use std::collections::HashSet;

use confique::meta::{FieldKind, Meta};
use serde::Serialize;
use toml::{Table, Value};

use crate::error::InifigError;
use crate::format::json_to_value;
use crate::keys::canonical_symbol;

/// Convert dotted-key overrides into a nested `toml::Table`.
///
/// `("database.url", Value::String("pg://"))` becomes `{database = {url = "pg://"}}`.
/// Segments are canonicalized, and if several entries target the same key
/// the last one wins. A key that nests below another override's scalar value
/// is an error.
pub fn overrides_to_table(entries: &[(String, Value)]) -> Result<Table, InifigError> {
    let mut table = Table::new();
    for (dotted_key, value) in entries {
        set_nested(&mut table, dotted_key, value.clone())?;
    }
    Ok(table)
}

fn set_nested(table: &mut Table, dotted_key: &str, value: Value) -> Result<(), InifigError> {
    let segments: Vec<String> = dotted_key.split('.').map(canonical_symbol).collect();
    let invalid = |reason: &str| InifigError::InvalidValue {
        key: dotted_key.to_string(),
        reason: reason.to_string(),
    };
    if segments.iter().any(String::is_empty) {
        return Err(invalid("empty key segment"));
    }
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(invalid("empty key"));
    };

    let mut current = table;
    for segment in parents {
        current = current
            .entry(segment.as_str())
            .or_insert_with(|| Value::Table(Table::new()))
            .as_table_mut()
            .ok_or_else(|| invalid("an override above this key is not a table"))?;
    }

    current.insert(leaf.clone(), value);
    Ok(())
}

/// Collect all valid leaf key paths from a confique `Meta` tree.
///
/// Returns dotted paths like `"host"`, `"database.url"`, `"database.pool_size"`.
/// Section names (nested structs) are excluded, only leaf fields are returned.
pub fn valid_keys(meta: &Meta) -> HashSet<String> {
    let mut keys = HashSet::new();
    collect_keys(meta, "", &mut keys);
    keys
}

fn collect_keys(meta: &Meta, prefix: &str, keys: &mut HashSet<String>) {
    for field in meta.fields {
        let dotted = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldKind::Leaf { .. } => {
                keys.insert(dotted);
            }
            FieldKind::Nested { meta, .. } => {
                collect_keys(meta, &dotted, keys);
            }
        }
    }
}

/// Serializes `source` into dotted key/value pairs, keeping only `valid` keys.
///
/// Absent options are skipped. Keys are canonicalized before matching, so a
/// source using `camelCase` field names still lines up.
pub fn matching_pairs<S: Serialize>(
    source: &S,
    valid: &HashSet<String>,
) -> Result<Vec<(String, Value)>, InifigError> {
    let json = serde_json::to_value(source).map_err(|e| InifigError::InvalidValue {
        key: "<overrides>".into(),
        reason: e.to_string(),
    })?;
    let mut pairs = Vec::new();
    if let Some(Value::Table(table)) = json_to_value(json) {
        flatten_into(&table, "", &mut pairs);
    }
    pairs.retain(|(key, _)| valid.contains(key));
    Ok(pairs)
}

fn flatten_into(table: &Table, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in table {
        let key = canonical_symbol(key);
        let dotted = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(sub) => flatten_into(sub, &dotted, out),
            other => out.push((dotted, other.clone())),
        }
    }
}
