//! Source formats and their conversion to `toml::Table`.
//!
//! Every config file, whatever its syntax, ends up as a `toml::Table` with
//! canonical keys so the layers can be deep-merged and deserialized the same
//! way. INI leaves stay strings; typing happens in [`coerce`](crate::coerce).

use std::path::Path;

use toml::{Table, Value};

use crate::error::InifigError;
use crate::ini::{self, Document};
use crate::keys;

/// Syntax of a config file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ini,
    Json,
    Yaml,
}

impl Format {
    /// `.json` and `.yaml`/`.yml` are recognized; anything else is INI.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Format::Json,
            Some("yaml" | "yml") => Format::Yaml,
            _ => Format::Ini,
        }
    }
}

/// Parses `content` in the format implied by `path`, with canonical keys.
pub fn parse_file(path: &Path, content: &str) -> Result<Table, InifigError> {
    let table = match Format::from_path(path) {
        Format::Ini => {
            let doc = ini::parse_str(content).map_err(|source| InifigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
            document_to_table(&doc)?
        }
        Format::Json => json_to_table(path, content)?,
        Format::Yaml => yaml_to_table(path, content)?,
    };
    keys::canonicalize_table(table, "")
}

/// Converts a parsed INI document into a table of strings.
///
/// A path written once becomes a string, a repeated one an array of strings.
/// Paths that only exist as an empty group are left out.
pub fn document_to_table(doc: &Document) -> Result<Table, InifigError> {
    let mut table = Table::new();
    for (symbol, child) in doc.fields() {
        if let Some(value) = document_value(child, symbol)? {
            table.insert(symbol.clone(), value);
        }
    }
    Ok(table)
}

fn document_value(doc: &Document, path: &str) -> Result<Option<Value>, InifigError> {
    match (doc.values(), doc.fields().is_empty()) {
        ([], true) => Ok(None),
        ([], false) => {
            let mut table = Table::new();
            for (symbol, child) in doc.fields() {
                if let Some(value) = document_value(child, &format!("{path}.{symbol}"))? {
                    table.insert(symbol.clone(), value);
                }
            }
            Ok((!table.is_empty()).then_some(Value::Table(table)))
        }
        ([single], true) => Ok(Some(Value::String(single.clone()))),
        (values, true) => Ok(Some(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        ))),
        (_, false) => Err(InifigError::ValuesAndFields {
            key: path.to_string(),
        }),
    }
}

fn json_to_table(path: &Path, content: &str) -> Result<Table, InifigError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format_error(path, e))?;
    match json_to_value(value) {
        Some(Value::Table(table)) => Ok(table),
        _ => Err(format_error(path, "top level must be an object")),
    }
}

pub(crate) fn json_to_value(value: serde_json::Value) -> Option<Value> {
    use serde_json::Value as Json;
    match value {
        Json::Null => None,
        Json::Bool(b) => Some(Value::Boolean(b)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        Json::String(s) => Some(Value::String(s)),
        Json::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(json_to_value).collect(),
        )),
        Json::Object(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(key, value)| json_to_value(value).map(|value| (key, value)))
                .collect(),
        )),
    }
}

fn yaml_to_table(path: &Path, content: &str) -> Result<Table, InifigError> {
    if content.trim().is_empty() {
        return Ok(Table::new());
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| format_error(path, e))?;
    match yaml_to_value(value).map_err(|reason| format_error(path, reason))? {
        None => Ok(Table::new()),
        Some(Value::Table(table)) => Ok(table),
        Some(_) => Err(format_error(path, "top level must be a mapping")),
    }
}

fn yaml_to_value(value: serde_yaml::Value) -> Result<Option<Value>, String> {
    use serde_yaml::Value as Yaml;
    Ok(match value {
        Yaml::Null => None,
        Yaml::Bool(b) => Some(Value::Boolean(b)),
        Yaml::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        Yaml::String(s) => Some(Value::String(s)),
        Yaml::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.extend(yaml_to_value(item)?);
            }
            Some(Value::Array(out))
        }
        Yaml::Mapping(map) => {
            let mut table = Table::new();
            for (key, value) in map {
                let Yaml::String(key) = key else {
                    return Err(format!("mapping keys must be strings, found {key:?}"));
                };
                if let Some(value) = yaml_to_value(value)? {
                    table.insert(key, value);
                }
            }
            Some(Value::Table(table))
        }
        Yaml::Tagged(tagged) => yaml_to_value(tagged.value)?,
    })
}

fn format_error(path: &Path, reason: impl ToString) -> InifigError {
    InifigError::FormatError {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
