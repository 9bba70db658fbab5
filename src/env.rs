use toml::{Table, Value};
use tracing::trace;

use crate::keys::canonical_symbol;

/// Build a `toml::Table` from environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels, so `APP__DATABASE__URL`
/// lands at `database.url`. Segments are canonicalized like file keys.
///
/// Values are kept as strings. The target field's type decides how they are
/// read, the same as for INI values.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    let mut table = Table::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        let segments: Vec<String> = rest.split("__").map(canonical_symbol).collect();
        if segments.iter().any(String::is_empty) {
            continue;
        }
        trace!(var = %key, "reading environment override");
        insert_nested(&mut table, &segments, Value::String(value));
    }

    table
}

fn insert_nested(table: &mut Table, segments: &[String], value: Value) {
    let Some((key, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        table.insert(key.clone(), value);
        return;
    }

    let sub = table
        .entry(key.as_str())
        .or_insert_with(|| Value::Table(Table::new()));
    if !sub.is_table() {
        *sub = Value::Table(Table::new());
    }
    if let Value::Table(sub_table) = sub {
        insert_nested(sub_table, rest, value);
    }
}
