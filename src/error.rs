use std::path::PathBuf;
use thiserror::Error;

use crate::ini;

#[derive(Debug, Error)]
pub enum InifigError {
    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownKeys(Vec<InifigError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: ini::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    FormatError { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Key '{key}' has both a value and nested keys")]
    ValuesAndFields { key: String },

    #[error("Key '{key}' is defined more than once with different spellings")]
    ConflictingKeys { key: String },

    #[error("App name is required, call .app_name() on the builder")]
    AppNameRequired,
}
