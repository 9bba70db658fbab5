//! Core resolution pipeline: merge all config layers and produce a typed config.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Parse each file in its own format, with canonical keys
//! 2. Validate each file (if strict mode)
//! 3. Deep-merge config files (later overrides earlier)
//! 4. Deep-merge env vars on top
//! 5. Deep-merge programmatic overrides on top (highest priority)
//! 6. Coerce the merged table into `C::Layer`
//! 7. Let confique fill defaults and validate required fields

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};
use tracing::debug;

use crate::coerce;
use crate::env;
use crate::error::InifigError;
use crate::file::SourceFile;
use crate::format;
use crate::merge::merge_all;
use crate::overrides;
use crate::validate;

/// All pre-loaded data needed to resolve a config. No I/O happens here.
pub struct ResolveInput {
    /// Files in precedence order: first = lowest priority, last = highest.
    pub files: Vec<SourceFile>,
    /// Raw environment variable pairs (pass `std::env::vars().collect()` or synthetic data).
    pub env_vars: Vec<(String, String)>,
    /// Env var prefix (e.g. `"MYAPP"`). `None` means env disabled.
    pub env_prefix: Option<String>,
    /// Overrides as `(dotted_key, value)` pairs.
    pub cli_overrides: Vec<(String, Value)>,
    /// Whether to reject unknown keys in config files.
    pub strict: bool,
}

/// Merges every layer of `input` into one table, without typing it.
pub fn merge_layers<C: Config>(input: ResolveInput) -> Result<Table, InifigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut layers = Vec::with_capacity(input.files.len() + 2);
    for file in &input.files {
        let table = format::parse_file(&file.path, &file.content)?;
        if input.strict {
            validate::validate_unknown_keys::<C>(&table, &file.content, &file.path)?;
        }
        debug!(path = %file.path.display(), keys = table.len(), "merging config file");
        layers.push(table);
    }

    if let Some(prefix) = &input.env_prefix {
        let env_table = env::env_to_table(prefix, input.env_vars);
        if !env_table.is_empty() {
            debug!(prefix, keys = env_table.len(), "merging environment");
            layers.push(env_table);
        }
    }

    if !input.cli_overrides.is_empty() {
        let cli_table = overrides::overrides_to_table(&input.cli_overrides)?;
        debug!(count = input.cli_overrides.len(), "merging overrides");
        layers.push(cli_table);
    }

    Ok(merge_all(layers))
}

/// Resolve configuration from pre-loaded inputs.
pub fn resolve<C: Config>(input: ResolveInput) -> Result<C, InifigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let merged = merge_layers::<C>(input)?;
    let layer: C::Layer = coerce::from_table(merged)?;

    C::builder()
        .preloaded(layer)
        .load()
        .map_err(InifigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{EnumConfig, ListConfig, Mode, NormalizedConfig, TestConfig};

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: path.into(),
            content: content.into(),
        }
    }

    fn empty_input() -> ResolveInput {
        ResolveInput {
            files: vec![],
            env_vars: vec![],
            env_prefix: None,
            cli_overrides: vec![],
            strict: true,
        }
    }

    fn with_files(files: Vec<SourceFile>) -> ResolveInput {
        ResolveInput {
            files,
            ..empty_input()
        }
    }

    #[test]
    fn defaults_only() {
        let config: TestConfig = resolve(empty_input()).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.database.pool_size, 5);
        assert_eq!(config.database.url, None);
    }

    #[test]
    fn ini_values_are_coerced() {
        let input = with_files(vec![file(
            "app.ini",
            "port = 0x1F90\ndebug = on\n[database]\npool-size = 12\n",
        )]);
        let config: TestConfig = resolve(input).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.debug);
        assert_eq!(config.database.pool_size, 12);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn later_file_overrides_earlier() {
        let input = with_files(vec![
            file("first.ini", "port = 1000\nhost = base\n"),
            file("second.ini", "port = 2000\n"),
        ]);
        let config: TestConfig = resolve(input).unwrap();
        assert_eq!(config.port, 2000);
        assert_eq!(config.host, "base");
    }

    #[test]
    fn formats_mix() {
        let input = with_files(vec![
            file("base.json", r#"{"database": {"url": "pg://base", "poolSize": 5}}"#),
            file("local.yaml", "database:\n  pool_size: 50\n"),
            file("user.ini", "debug = true\n"),
        ]);
        let config: TestConfig = resolve(input).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("pg://base"));
        assert_eq!(config.database.pool_size, 50);
        assert!(config.debug);
    }

    #[test]
    fn env_overrides_file() {
        let input = ResolveInput {
            files: vec![file("app.ini", "port = 3000\n")],
            env_vars: vec![("MYAPP__PORT".into(), "5000".into())],
            env_prefix: Some("MYAPP".into()),
            ..empty_input()
        };
        let config: TestConfig = resolve(input).unwrap();
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn overrides_beat_everything() {
        let input = ResolveInput {
            files: vec![file("app.ini", "port = 3000\n")],
            env_vars: vec![("MYAPP__PORT".into(), "5000".into())],
            env_prefix: Some("MYAPP".into()),
            cli_overrides: vec![("port".into(), Value::Integer(9999))],
            strict: true,
        };
        let config: TestConfig = resolve(input).unwrap();
        assert_eq!(config.port, 9999);
    }

    #[test]
    fn sparse_merge_across_layers() {
        let input = ResolveInput {
            files: vec![file("app.ini", "host = filehost\n[database]\npool_size = 20\n")],
            env_vars: vec![("APP__PORT".into(), "4000".into())],
            env_prefix: Some("APP".into()),
            cli_overrides: vec![("debug".into(), Value::Boolean(true))],
            strict: true,
        };
        let config: TestConfig = resolve(input).unwrap();
        assert_eq!(config.host, "filehost");
        assert_eq!(config.port, 4000);
        assert!(config.debug);
        assert_eq!(config.database.pool_size, 20);
    }

    #[test]
    fn strict_rejects_unknown_key() {
        let result: Result<TestConfig, _> = resolve(with_files(vec![file("bad.ini", "typo = 1\n")]));
        assert!(matches!(result, Err(InifigError::UnknownKeys(_))));
    }

    #[test]
    fn lenient_allows_unknown_key() {
        let input = ResolveInput {
            files: vec![file("ok.ini", "typo = 1\nport = 3000\n")],
            strict: false,
            ..empty_input()
        };
        let config: TestConfig = resolve(input).unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let result: Result<TestConfig, _> =
            resolve(with_files(vec![file("broken.ini", "port = 'open\n")]));
        match result {
            Err(InifigError::ParseError { path, .. }) => assert_eq!(path.to_str(), Some("broken.ini")),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn repeated_key_for_scalar_is_too_many_values() {
        let input = ResolveInput {
            files: vec![file("app.ini", "port = 1\nport = 2\n")],
            strict: false,
            ..empty_input()
        };
        match resolve::<TestConfig>(input) {
            Err(InifigError::InvalidValue { key, reason }) => {
                assert_eq!(key, "port");
                assert_eq!(reason, "too many values");
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_integer_is_invalid() {
        let input = ResolveInput {
            files: vec![file("app.ini", "port = 70000\n")],
            strict: false,
            ..empty_input()
        };
        assert!(matches!(
            resolve::<TestConfig>(input),
            Err(InifigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn enum_from_ini_text() {
        let config: EnumConfig = resolve(with_files(vec![file("app.ini", "mode = slow\n")])).unwrap();
        assert_eq!(config.mode, Mode::Slow);

        let result: Result<EnumConfig, _> =
            resolve(with_files(vec![file("app.ini", "mode = medium\n")]));
        assert!(result.is_err());
    }

    #[test]
    fn repeated_keys_fill_lists() {
        let config: ListConfig = resolve(with_files(vec![file(
            "app.ini",
            "tag = a\ntag = 'b c'\nports = 0x1F90\n",
        )]))
        .unwrap();
        assert_eq!(config.tag, ["a", "b c"]);
        assert_eq!(config.ports, [8080]);

        let defaults: ListConfig = resolve(empty_input()).unwrap();
        assert!(defaults.tag.is_empty());
        assert_eq!(defaults.ports, [80]);
    }

    #[test]
    fn deserialize_with_sees_coerced_strings() {
        let config: NormalizedConfig =
            resolve(with_files(vec![file("app.ini", "color = BLUE\ncount = 7\n")])).unwrap();
        assert_eq!(config.color, "blue");
        assert_eq!(config.count, 7);
    }

    #[test]
    fn merge_layers_keeps_strings() {
        let merged = merge_layers::<TestConfig>(with_files(vec![file("app.ini", "port = 3000\n")]))
            .unwrap();
        assert_eq!(merged["port"].as_str(), Some("3000"));
    }
}
