//! Config operations: template generation, key lookup, listing, and result types.
//!
//! Provides the logic behind `config list`, `config gen`, `config get`, and the
//! `ConfigResult` enum that callers use to display results.

use std::fmt;
use std::path::PathBuf;

use confique::Config;
use confique::meta::{FieldKind, LeafKind, Meta};
use serde::Serialize;
use toml::{Table, Value};

use crate::error::InifigError;
use crate::ini;

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A generated INI template string.
    Template(String),
    /// Confirmation that a template was written to a file.
    TemplateWritten { path: PathBuf },
    /// A key's resolved value and its doc comment.
    KeyValue {
        key: String,
        value: String,
        doc: Vec<String>,
    },
    /// All resolved configuration key-value pairs.
    Listing { entries: Vec<(String, String)> },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Template(t) => write!(f, "{t}"),
            ConfigResult::TemplateWritten { path } => {
                write!(f, "Config template written to {}", path.display())
            }
            ConfigResult::KeyValue { key, value, doc } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key} = {value}")
            }
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Generate a commented INI template from the config struct's doc comments
/// and defaults.
///
/// Every entry is commented out. Nested structs become `[group]` blocks; since
/// a blank line ends a group, fields inside one are separated by `#` lines.
pub fn generate_template<C: Config>() -> String {
    let mut out = String::new();
    for line in C::META.doc {
        push_doc(&mut out, line);
    }
    write_fields(&mut out, &C::META, &[]);
    out
}

fn push_doc(out: &mut String, line: &str) {
    if line.trim().is_empty() {
        out.push_str("#\n");
    } else {
        out.push_str("# ");
        out.push_str(line.trim());
        out.push('\n');
    }
}

fn write_fields(out: &mut String, meta: &Meta, group: &[&str]) {
    let mut first = true;
    for field in meta.fields {
        let FieldKind::Leaf { kind, .. } = &field.kind else {
            continue;
        };
        if !first || (group.is_empty() && !out.is_empty()) {
            out.push_str(if group.is_empty() { "\n" } else { "#\n" });
        }
        first = false;

        for line in field.doc {
            push_doc(out, line);
        }
        match kind {
            LeafKind::Required {
                default: Some(expr),
            } => match Value::try_from(expr) {
                Ok(value) => {
                    for rendered in render_value(&value) {
                        out.push_str(&format!("#{} = {rendered}\n", field.name));
                    }
                }
                Err(_) => out.push_str(&format!("# {} =\n", field.name)),
            },
            LeafKind::Required { default: None } => {
                out.push_str("# Required.\n");
                out.push_str(&format!("# {} =\n", field.name));
            }
            LeafKind::Optional => out.push_str(&format!("# {} =\n", field.name)),
        }
    }

    for field in meta.fields {
        let FieldKind::Nested { meta: nested, .. } = &field.kind else {
            continue;
        };
        let mut path = group.to_vec();
        path.push(field.name);

        out.push('\n');
        for line in field.doc {
            push_doc(out, line);
        }
        out.push_str(&format!("[{}]\n", path.join(".")));
        write_fields(out, nested, &path);
    }
}

/// Renders a value as INI value text, one string per repetition.
fn render_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if ini::is_bare_safe(s) => vec![s.clone()],
        Value::String(s) => vec![ini::quote(s)],
        Value::Array(items) => items.iter().flat_map(render_value).collect(),
        Value::Table(_) => Vec::new(),
        other => vec![format_value(other)],
    }
}

/// Get a config value by dotted key, including its doc comment.
pub fn get_value<C: Config + Serialize>(
    config: &C,
    key: &str,
) -> Result<ConfigResult, InifigError> {
    let table = to_table(config, key)?;
    let value = table_get(&table, key).ok_or_else(|| InifigError::KeyNotFound(key.into()))?;

    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value: format_value(value),
        doc: lookup_doc(&C::META, key),
    })
}

/// List all resolved config values as dotted key-value pairs, in field order.
///
/// Optional fields that are unset show as `<not set>`.
pub fn list_values<C: Config + Serialize>(config: &C) -> Result<ConfigResult, InifigError> {
    let table = to_table(config, "<list>")?;
    let mut entries = Vec::new();
    collect_entries(&C::META, "", &table, &mut entries);
    Ok(ConfigResult::Listing { entries })
}

fn to_table<C: Serialize>(config: &C, key: &str) -> Result<Table, InifigError> {
    let invalid = |reason: String| InifigError::InvalidValue {
        key: key.into(),
        reason,
    };
    match Value::try_from(config).map_err(|e| invalid(e.to_string()))? {
        Value::Table(table) => Ok(table),
        _ => Err(invalid("config did not serialize to a table".into())),
    }
}

fn collect_entries(meta: &Meta, prefix: &str, table: &Table, out: &mut Vec<(String, String)>) {
    for field in meta.fields {
        let dotted = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.kind {
            FieldKind::Leaf { .. } => {
                let display = table_get(table, &dotted)
                    .map(format_value)
                    .unwrap_or_else(|| "<not set>".to_string());
                out.push((dotted, display));
            }
            FieldKind::Nested { meta, .. } => collect_entries(meta, &dotted, table, out),
        }
    }
}

/// Navigate a `toml::Table` by dotted key path (e.g. `"database.url"`).
pub fn table_get<'a>(table: &'a Table, dotted_key: &str) -> Option<&'a Value> {
    let mut segments = dotted_key.split('.');
    let first = segments.next()?;
    segments.try_fold(table.get(first)?, |value, segment| {
        value.as_table()?.get(segment)
    })
}

/// Format a value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(dt) => dt.to_string(),
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Table(t) => toml::to_string(t).unwrap_or_else(|_| format!("{t:?}")),
    }
}

/// Walk confique's `Meta` tree to find the doc comment for a dotted key path.
fn lookup_doc(meta: &Meta, dotted_key: &str) -> Vec<String> {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    lookup_doc_recursive(meta, &segments)
}

fn lookup_doc_recursive(meta: &Meta, segments: &[&str]) -> Vec<String> {
    let Some((first, rest)) = segments.split_first() else {
        return vec![];
    };
    let Some(field) = meta.fields.iter().find(|f| f.name == *first) else {
        return vec![];
    };
    match (&field.kind, rest.is_empty()) {
        (_, true) => field.doc.iter().map(|s| s.trim().to_string()).collect(),
        (FieldKind::Nested { meta: nested, .. }, false) => lookup_doc_recursive(nested, rest),
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SourceFile;
    use crate::fixtures::test::TestConfig;
    use crate::resolve::{ResolveInput, resolve};

    fn test_config() -> TestConfig {
        TestConfig::builder().load().unwrap()
    }

    #[test]
    fn template_contains_keys_and_docs() {
        let template = generate_template::<TestConfig>();
        assert!(template.contains("#host = localhost"));
        assert!(template.contains("#port = 8080"));
        assert!(template.contains("[database]"));
        assert!(template.contains("#pool_size = 5"));
        assert!(template.contains("# The application host."));
        assert!(template.contains("# Database settings."));
    }

    #[test]
    fn template_is_valid_ini_and_empty() {
        let template = generate_template::<TestConfig>();
        let table = crate::format::parse_file(std::path::Path::new("app.ini"), &template).unwrap();
        assert!(table.is_empty(), "{template}");
    }

    #[test]
    fn uncommented_template_resolves_to_defaults() {
        let template = generate_template::<TestConfig>();
        let uncommented: String = template
            .lines()
            .map(|line| match line.strip_prefix('#') {
                Some(rest) if !rest.is_empty() && !rest.starts_with(' ') => rest,
                _ => line,
            })
            .collect::<Vec<_>>()
            .join("\n");

        let config: TestConfig = resolve(ResolveInput {
            files: vec![SourceFile {
                path: "app.ini".into(),
                content: uncommented,
            }],
            env_vars: vec![],
            env_prefix: None,
            cli_overrides: vec![],
            strict: true,
        })
        .unwrap();
        assert_eq!(config, test_config());
    }

    #[test]
    fn template_quotes_strings_that_need_it() {
        assert_eq!(render_value(&Value::String("plain".into())), ["plain"]);
        assert_eq!(render_value(&Value::String("a # b".into())), ["\"a # b\""]);
        assert_eq!(
            render_value(&Value::Array(vec![Value::Integer(1), Value::Integer(2)])),
            ["1", "2"]
        );
    }

    #[test]
    fn get_flat_and_nested_keys() {
        let config = test_config();
        match get_value(&config, "port").unwrap() {
            ConfigResult::KeyValue { value, .. } => assert_eq!(value, "8080"),
            other => panic!("Expected KeyValue, got {other:?}"),
        }
        match get_value(&config, "database.pool_size").unwrap() {
            ConfigResult::KeyValue { value, doc, .. } => {
                assert_eq!(value, "5");
                assert_eq!(doc, ["Connection pool size."]);
            }
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn get_nonexistent_key() {
        let config = test_config();
        assert!(matches!(
            get_value(&config, "nonexistent"),
            Err(InifigError::KeyNotFound(_))
        ));
        assert!(matches!(
            get_value(&config, "port.deeper"),
            Err(InifigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn get_unset_optional_is_not_found() {
        let config = test_config();
        assert!(matches!(
            get_value(&config, "database.url"),
            Err(InifigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn table_get_walks_dotted_paths() {
        let table: Table = toml::from_str("port = 8080\n[database]\npool_size = 5").unwrap();
        assert_eq!(table_get(&table, "port").and_then(Value::as_integer), Some(8080));
        assert_eq!(
            table_get(&table, "database.pool_size").and_then(Value::as_integer),
            Some(5)
        );
        assert!(table_get(&table, "nope").is_none());
        assert!(table_get(&table, "database.nope").is_none());
    }

    #[test]
    fn list_values_in_field_order() {
        let config = test_config();
        let ConfigResult::Listing { entries } = list_values(&config).unwrap() else {
            panic!("Expected Listing");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["host", "port", "debug", "database.url", "database.pool_size"]);
        assert_eq!(entries[0].1, "localhost");
        assert_eq!(entries[3].1, "<not set>");
    }

    #[test]
    fn listing_display_format() {
        let result = ConfigResult::Listing {
            entries: vec![
                ("host".into(), "localhost".into()),
                ("port".into(), "8080".into()),
            ],
        };
        assert_eq!(result.to_string(), "host = localhost\nport = 8080");
    }

    #[test]
    fn key_value_display_includes_doc() {
        let result = ConfigResult::KeyValue {
            key: "port".into(),
            value: "8080".into(),
            doc: vec!["The port number.".into()],
        };
        assert_eq!(result.to_string(), "# The port number.\nport = 8080");
    }
}
