//! Config file discovery.
//!
//! Each [`SearchPath`] resolves to zero or more directories, which are
//! concatenated in priority-ascending order (last = highest priority).
//! `Ancestors` expands inline, shallowest directory first, so the directory
//! closest to the starting point ends up with the highest priority.
//!
//! Every directory is then checked for `{dir}/{file_name}`. Under
//! [`SearchMode::Merge`] all files found are returned for the resolve pipeline
//! to deep-merge; under [`SearchMode::FirstMatch`] only the highest priority
//! one is. Missing files are skipped in both modes, any other I/O error is
//! returned.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::InifigError;
use crate::types::{Boundary, SearchMode, SearchPath};

/// A config file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

/// The directories a [`SearchPath`] stands for, lowest priority first.
///
/// `start` replaces the current directory for `Cwd` and `Ancestors`. Paths
/// that cannot be resolved (no home directory, say) yield nothing.
pub fn search_dirs(sp: &SearchPath, app_name: &str, start: Option<&Path>) -> Vec<PathBuf> {
    let cwd = || match start {
        Some(dir) => Some(dir.to_path_buf()),
        None => std::env::current_dir().ok(),
    };
    match sp {
        SearchPath::Platform => directories::ProjectDirs::from("", "", app_name)
            .map(|proj| proj.config_dir().to_path_buf())
            .into_iter()
            .collect(),
        SearchPath::Home(subdir) => directories::UserDirs::new()
            .map(|user| user.home_dir().join(subdir))
            .into_iter()
            .collect(),
        SearchPath::Cwd => cwd().into_iter().collect(),
        SearchPath::Path(p) => vec![p.clone()],
        SearchPath::Ancestors(boundary) => cwd()
            .map(|dir| ancestors(&dir, boundary))
            .unwrap_or_default(),
    }
}

/// Walks from `start` toward the root, stopping at `boundary`.
///
/// A [`Boundary::Marker`] stops at (and includes) the first directory that
/// contains the marker, and walks to the root when none does. The result is
/// shallowest first.
pub fn ancestors(start: &Path, boundary: &Boundary) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for dir in start.ancestors() {
        dirs.push(dir.to_path_buf());
        if let Boundary::Marker(name) = boundary
            && dir.join(name).exists()
        {
            break;
        }
    }
    dirs.reverse();
    dirs
}

/// Expands all search paths into one priority-ascending directory list.
pub fn expand_search_paths(
    search_paths: &[SearchPath],
    app_name: &str,
    start: Option<&Path>,
) -> Vec<PathBuf> {
    search_paths
        .iter()
        .flat_map(|sp| search_dirs(sp, app_name, start))
        .collect()
}

/// Finds and reads the config files for `file_name`, respecting `mode`.
pub fn load_config_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
    mode: SearchMode,
) -> Result<Vec<SourceFile>, InifigError> {
    let dirs = expand_search_paths(search_paths, app_name, None);
    debug!(dirs = dirs.len(), ?mode, file_name, "searching for config files");

    match mode {
        SearchMode::Merge => load_all(&dirs, file_name),
        SearchMode::FirstMatch => load_first_match(&dirs, file_name),
    }
}

fn load_all(dirs: &[PathBuf], file_name: &str) -> Result<Vec<SourceFile>, InifigError> {
    let mut found = Vec::new();
    for dir in dirs {
        found.extend(read_if_present(dir.join(file_name))?);
    }
    Ok(found)
}

fn load_first_match(dirs: &[PathBuf], file_name: &str) -> Result<Vec<SourceFile>, InifigError> {
    for dir in dirs.iter().rev() {
        if let Some(file) = read_if_present(dir.join(file_name))? {
            return Ok(vec![file]);
        }
    }
    Ok(Vec::new())
}

fn read_if_present(path: PathBuf) -> Result<Option<SourceFile>, InifigError> {
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            debug!(path = %path.display(), "found config file");
            Ok(Some(SourceFile { path, content }))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(InifigError::IoError { path, source }),
    }
}
