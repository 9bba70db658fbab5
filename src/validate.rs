//! Strict-mode validation: detect unknown keys in config files.
//!
//! Each file's table is deserialized into `C::Layer` (all-optional fields)
//! through `serde_ignored`, which reports every key the layer doesn't consume.
//! Each unknown key is reported with its file path and a best-effort line
//! number.

use std::path::Path;

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};

use crate::coerce::Coerce;
use crate::error::InifigError;
use crate::format::Format;
use crate::keys::{canonical, canonical_symbol};

/// Validate that a parsed config file contains no keys unknown to `C`.
///
/// `table` is the file's canonicalized content and `content` its source text,
/// used only to locate keys.
pub fn validate_unknown_keys<C: Config>(
    table: &Table,
    content: &str,
    path: &Path,
) -> Result<(), InifigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut unknown_keys: Vec<String> = Vec::new();

    let deserializer = Coerce::new(Value::Table(table.clone()));
    let _layer: C::Layer = serde_ignored::deserialize(deserializer, |ignored_path| {
        unknown_keys.push(ignored_path.to_string());
    })?;

    if unknown_keys.is_empty() {
        return Ok(());
    }

    let format = Format::from_path(path);
    let errors: Vec<InifigError> = unknown_keys
        .into_iter()
        .map(|key| {
            let line = match format {
                Format::Ini => find_ini_key_line(content, &key),
                Format::Json | Format::Yaml => find_mapping_key_line(content, &key),
            };
            InifigError::UnknownKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect();

    Err(InifigError::UnknownKeys(errors))
}

fn split_key(key: &str) -> Vec<String> {
    let segments: Vec<&str> = key.split("::").flat_map(|part| part.split('.')).collect();
    canonical(&segments)
}

/// Find the 1-indexed line that defines a canonical dotted key in INI text.
///
/// Tracks `[group]` headers, which stay in effect until the next blank line,
/// and compares keys in canonical form so `poolSize` and `database::typo`
/// are found. Returns 0 if the key cannot be located.
fn find_ini_key_line(content: &str, dotted_key: &str) -> usize {
    let expected: Vec<&str> = dotted_key.split('.').collect();
    let mut group: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            group.clear();
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('[') {
            let header = header.split(']').next().unwrap_or_default();
            group = split_key(header.trim());
            continue;
        }
        let Some((key, _)) = trimmed.split_once('=') else {
            continue;
        };

        let full = group.iter().cloned().chain(split_key(key.trim()));
        if full.eq(expected.iter().map(|s| s.to_string())) {
            return i + 1;
        }
    }
    0
}

/// Find the line of the leaf key of `dotted_key` in JSON or YAML text.
///
/// Only the leaf is matched, so this is a rougher guess than the INI finder.
fn find_mapping_key_line(content: &str, dotted_key: &str) -> usize {
    let leaf = dotted_key.rsplit('.').next().unwrap_or(dotted_key);
    for (i, line) in content.lines().enumerate() {
        let Some((key, _)) = line.trim().trim_start_matches(['{', ',']).split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches(['"', '\'']);
        if canonical_symbol(key) == leaf {
            return i + 1;
        }
    }
    0
}
