use std::path::PathBuf;

/// Where to search for config files.
///
/// Entries are listed lowest priority first: with [`SearchMode::Merge`] later
/// files override earlier ones, with [`SearchMode::FirstMatch`] the last
/// existing file wins alone.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit path.
    Path(PathBuf),
    /// The current directory and its parents, up to `Boundary`.
    ///
    /// Expands so that the directory nearest the cwd has the highest priority.
    Ancestors(Boundary),
}

/// Where an [`SearchPath::Ancestors`] walk stops.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Walk up to the filesystem root.
    Root,
    /// Stop at the first directory containing this entry (inclusive),
    /// e.g. `Marker(".git")`.
    Marker(&'static str),
}

/// How discovered config files combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Deep-merge every file found; higher priority wins key by key.
    #[default]
    Merge,
    /// Use only the highest priority file found.
    FirstMatch,
}

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    List,
    Gen { output: Option<PathBuf> },
    Get { key: String },
}
