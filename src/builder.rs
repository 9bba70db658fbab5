use std::marker::PhantomData;

use confique::Config;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InifigError;
use crate::file;
use crate::ops::{self, ConfigResult};
use crate::overrides;
use crate::resolve::{self, ResolveInput};
use crate::types::{ConfigAction, SearchMode, SearchPath};

/// Entry point for building an inifig configuration.
pub struct Inifig;

impl Inifig {
    pub fn builder<C: Config>() -> InifigBuilder<C> {
        InifigBuilder::new()
    }
}

/// Builder for configuring and loading layered configuration.
///
/// Discovery is set with [`search_paths()`](Self::search_paths), and how the
/// files found combine with [`search_mode()`](Self::search_mode).
pub struct InifigBuilder<C: Config> {
    app_name: Option<String>,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    search_mode: SearchMode,
    env_prefix: Option<String>,
    env_enabled: bool,
    strict: bool,
    cli_overrides: Vec<(String, toml::Value)>,
    override_error: Option<InifigError>,
    _phantom: PhantomData<C>,
}

impl<C: Config> InifigBuilder<C> {
    fn new() -> Self {
        Self {
            app_name: None,
            file_name: None,
            search_paths: None,
            search_mode: SearchMode::default(),
            env_prefix: None,
            env_enabled: true,
            strict: true,
            cli_overrides: Vec::new(),
            override_error: None,
            _phantom: PhantomData,
        }
    }

    /// Set the application name. This derives sensible defaults:
    /// - `file_name` → `"{app_name}.ini"`
    /// - `search_paths` → `[SearchPath::Platform]`
    /// - `env_prefix` → `"{APP_NAME}"` (uppercased)
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the config file name (default: `"{app_name}.ini"`).
    ///
    /// The extension picks the format: `.json`, `.yaml`/`.yml`, anything else
    /// is read as INI.
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Replace the default search paths entirely.
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has the
    /// highest priority.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    /// If no paths have been set yet, starts from the default `[Platform]`.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    /// Set the search mode (default: [`SearchMode::Merge`]).
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Override the environment variable prefix (default: uppercased `app_name`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Add an override. `None` values are ignored (useful for optional clap args).
    pub fn cli_override<V: Into<toml::Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.cli_overrides.push((key.to_string(), v.into()));
        }
        self
    }

    /// Add overrides from any serializable source, auto-matching by field name.
    ///
    /// Serializes `source`, skips `None` values, and keeps only keys that
    /// match config fields in `C`, so clap-only fields like `command` or
    /// `verbose` drop out. A source that cannot be serialized makes the next
    /// [`load()`](Self::load) fail.
    pub fn cli_overrides_from<S: Serialize>(mut self, source: &S) -> Self {
        match overrides::matching_pairs(source, &overrides::valid_keys(&C::META)) {
            Ok(pairs) => self.cli_overrides.extend(pairs),
            Err(e) => {
                self.override_error.get_or_insert(e);
            }
        }
        self
    }

    fn effective_app_name(&self) -> Result<&str, InifigError> {
        self.app_name
            .as_deref()
            .ok_or(InifigError::AppNameRequired)
    }

    fn effective_file_name(&self) -> Result<String, InifigError> {
        if let Some(name) = &self.file_name {
            return Ok(name.clone());
        }
        let app = self.effective_app_name()?;
        Ok(format!("{app}.ini"))
    }

    fn effective_search_paths(&self) -> Vec<SearchPath> {
        self.search_paths
            .clone()
            .unwrap_or_else(|| vec![SearchPath::Platform])
    }

    /// Resolve the effective env prefix (None if env disabled).
    fn effective_env_prefix(&self) -> Result<Option<String>, InifigError> {
        if !self.env_enabled {
            return Ok(None);
        }
        if let Some(prefix) = &self.env_prefix {
            return Ok(Some(prefix.clone()));
        }
        let app = self.effective_app_name()?;
        Ok(Some(app.to_uppercase()))
    }

    /// Reads files and environment into a `ResolveInput`.
    fn build_input(&mut self) -> Result<ResolveInput, InifigError> {
        if let Some(e) = self.override_error.take() {
            return Err(e);
        }
        let app_name = self.effective_app_name()?;
        let file_name = self.effective_file_name()?;
        let search_paths = self.effective_search_paths();
        let env_prefix = self.effective_env_prefix()?;

        let files = file::load_config_files(&search_paths, &file_name, app_name, self.search_mode)?;
        debug!(app_name, files = files.len(), "loading configuration");
        let env_vars: Vec<(String, String)> = std::env::vars().collect();

        Ok(ResolveInput {
            files,
            env_vars,
            env_prefix,
            cli_overrides: std::mem::take(&mut self.cli_overrides),
            strict: self.strict,
        })
    }

    /// Load and resolve the configuration through all layers.
    pub fn load(mut self) -> Result<C, InifigError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        let input = self.build_input()?;
        resolve::resolve(input)
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(self, action: &ConfigAction) -> Result<(), InifigError>
    where
        C: Serialize,
        C::Layer: for<'de> Deserialize<'de>,
    {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / gen / get).
    pub fn handle(self, action: &ConfigAction) -> Result<ConfigResult, InifigError>
    where
        C: Serialize,
        C::Layer: for<'de> Deserialize<'de>,
    {
        match action {
            ConfigAction::List => {
                let config = self.load()?;
                ops::list_values(&config)
            }
            ConfigAction::Gen { output } => {
                let template = ops::generate_template::<C>();
                let Some(path) = output else {
                    return Ok(ConfigResult::Template(template));
                };
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| InifigError::IoError {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                std::fs::write(path, &template).map_err(|source| InifigError::IoError {
                    path: path.clone(),
                    source,
                })?;
                Ok(ConfigResult::TemplateWritten { path: path.clone() })
            }
            ConfigAction::Get { key } => {
                let config = self.load()?;
                ops::get_value(&config, key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::TestConfig;
    use crate::types::Boundary;
    use std::fs;
    use tempfile::TempDir;

    fn in_dir(dir: &TempDir) -> InifigBuilder<TestConfig> {
        Inifig::builder::<TestConfig>()
            .app_name("test")
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .no_env()
    }

    #[test]
    fn app_name_sets_defaults() {
        let builder = Inifig::builder::<TestConfig>().app_name("myapp");
        assert_eq!(builder.effective_file_name().unwrap(), "myapp.ini");
        assert_eq!(
            builder.effective_env_prefix().unwrap(),
            Some("MYAPP".to_string())
        );
        assert_eq!(builder.effective_search_paths(), vec![SearchPath::Platform]);
        assert_eq!(builder.search_mode, SearchMode::Merge);
        assert!(builder.strict);
    }

    #[test]
    fn override_file_name_and_prefix() {
        let builder = Inifig::builder::<TestConfig>()
            .app_name("myapp")
            .file_name("custom.yaml")
            .env_prefix("CUSTOM");
        assert_eq!(builder.effective_file_name().unwrap(), "custom.yaml");
        assert_eq!(
            builder.effective_env_prefix().unwrap(),
            Some("CUSTOM".to_string())
        );
    }

    #[test]
    fn no_env_disables_prefix() {
        let builder = Inifig::builder::<TestConfig>().app_name("myapp").no_env();
        assert_eq!(builder.effective_env_prefix().unwrap(), None);
    }

    #[test]
    fn add_search_path_appends_to_defaults() {
        let builder = Inifig::builder::<TestConfig>()
            .app_name("myapp")
            .add_search_path(SearchPath::Ancestors(Boundary::Marker(".git")));
        assert_eq!(
            builder.effective_search_paths(),
            vec![
                SearchPath::Platform,
                SearchPath::Ancestors(Boundary::Marker(".git"))
            ]
        );
    }

    #[test]
    fn add_search_path_appends_to_existing_list() {
        let builder = Inifig::builder::<TestConfig>()
            .app_name("myapp")
            .search_paths(vec![SearchPath::Cwd])
            .add_search_path(SearchPath::Platform);
        assert_eq!(
            builder.effective_search_paths(),
            vec![SearchPath::Cwd, SearchPath::Platform]
        );
    }

    #[test]
    fn cli_override_none_skipped() {
        let builder = Inifig::builder::<TestConfig>()
            .app_name("myapp")
            .cli_override::<i64>("port", None)
            .cli_override("host", Some("example.org"));
        assert_eq!(builder.cli_overrides.len(), 1);
        assert_eq!(builder.cli_overrides[0].0, "host");
    }

    #[test]
    fn missing_app_name_errors() {
        let result = Inifig::builder::<TestConfig>().load();
        assert!(matches!(result, Err(InifigError::AppNameRequired)));
    }

    #[test]
    fn load_with_ini_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("test.ini"),
            "port = 3000\n\n[database]\npool-size = 7\n",
        )
        .unwrap();

        let config: TestConfig = in_dir(&dir).load().unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database.pool_size, 7);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn load_with_json_file_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.json"), r#"{"port": 3000}"#).unwrap();

        let config: TestConfig = in_dir(&dir).file_name("test.json").load().unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn load_defaults_only() {
        let dir = TempDir::new().unwrap();
        let config: TestConfig = in_dir(&dir).load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
    }

    #[test]
    fn load_with_cli_override() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.ini"), "port = 3000\n").unwrap();

        let config: TestConfig = in_dir(&dir)
            .cli_override("port", Some(9999i64))
            .load()
            .unwrap();
        assert_eq!(config.port, 9999);
    }

    #[test]
    fn load_with_overrides_from_struct() {
        #[derive(Serialize)]
        struct Cli {
            port: Option<u16>,
            host: Option<String>,
            verbose: bool,
        }
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.ini"), "host = filehost\n").unwrap();

        let config: TestConfig = in_dir(&dir)
            .cli_overrides_from(&Cli {
                port: Some(4242),
                host: None,
                verbose: true,
            })
            .load()
            .unwrap();
        assert_eq!(config.port, 4242);
        assert_eq!(config.host, "filehost");
    }

    #[test]
    fn strict_rejects_unknown_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.ini"), "typo = 1\n").unwrap();

        let result = in_dir(&dir).strict(true).load();
        match result {
            Err(InifigError::UnknownKeys(keys)) => {
                assert!(keys[0].to_string().contains("test.ini"));
            }
            other => panic!("Expected UnknownKeys, got {other:?}"),
        }
    }

    #[test]
    fn lenient_allows_unknown_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.ini"), "typo = 1\nport = 3000\n").unwrap();

        let config: TestConfig = in_dir(&dir).strict(false).load().unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn first_match_uses_highest_priority_file_only() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir1.path().join("test.ini"), "port = 1000\nhost = low\n").unwrap();
        fs::write(dir2.path().join("test.ini"), "port = 2000\n").unwrap();

        let config: TestConfig = Inifig::builder()
            .app_name("test")
            .search_paths(vec![
                SearchPath::Path(dir1.path().to_path_buf()),
                SearchPath::Path(dir2.path().to_path_buf()),
            ])
            .search_mode(SearchMode::FirstMatch)
            .no_env()
            .load()
            .unwrap();

        assert_eq!(config.port, 2000);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn merge_mode_combines_both_files() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir1.path().join("test.ini"), "port = 1000\nhost = base\n").unwrap();
        fs::write(dir2.path().join("test.ini"), "port = 2000\n").unwrap();

        let config: TestConfig = Inifig::builder()
            .app_name("test")
            .search_paths(vec![
                SearchPath::Path(dir1.path().to_path_buf()),
                SearchPath::Path(dir2.path().to_path_buf()),
            ])
            .no_env()
            .load()
            .unwrap();

        assert_eq!(config.port, 2000);
        assert_eq!(config.host, "base");
    }

    #[test]
    fn handle_gen() {
        let result = Inifig::builder::<TestConfig>()
            .app_name("test")
            .no_env()
            .handle(&ConfigAction::Gen { output: None })
            .unwrap();

        match result {
            ConfigResult::Template(t) => {
                assert!(t.contains("#host = localhost"));
                assert!(t.contains("[database]"));
            }
            other => panic!("Expected Template, got {other:?}"),
        }
    }

    #[test]
    fn handle_gen_with_output() {
        let dir = TempDir::new().unwrap();
        let out_path = dir.path().join("nested").join("generated.ini");

        let result = Inifig::builder::<TestConfig>()
            .app_name("test")
            .no_env()
            .handle(&ConfigAction::Gen {
                output: Some(out_path.clone()),
            })
            .unwrap();

        assert_eq!(result, ConfigResult::TemplateWritten { path: out_path.clone() });
        let content = fs::read_to_string(&out_path).unwrap();
        assert!(content.contains("#port = 8080"));
    }

    #[test]
    fn handle_get() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.ini"), "port = 3000\n").unwrap();

        let result = in_dir(&dir)
            .handle(&ConfigAction::Get { key: "port".into() })
            .unwrap();
        match result {
            ConfigResult::KeyValue { value, doc, .. } => {
                assert_eq!(value, "3000");
                assert_eq!(doc, ["The port number."]);
            }
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn handle_list() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.ini"), "debug = yes\n").unwrap();

        let ConfigResult::Listing { entries } = in_dir(&dir).handle(&ConfigAction::List).unwrap()
        else {
            panic!("Expected Listing");
        };
        assert!(entries.contains(&("debug".to_string(), "true".to_string())));
    }
}
