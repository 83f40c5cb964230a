//! Config file discovery.
//!
//! Each [`SearchPath`] resolves to one concrete directory. The directories are
//! checked in order for `{dir}/{file_name}`:
//!
//! - [`SearchMode::Merge`]: every file found is returned in priority order, so
//!   the load deep-merges them with later files overriding earlier ones.
//! - [`SearchMode::FirstMatch`]: the list is searched from the
//!   **highest-priority end** and the first file found is the only result.
//!
//! Missing files are silently skipped in both modes. Other I/O errors
//! (permissions, etc.) are propagated.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ClapbindError;
use crate::types::{SearchMode, SearchPath};

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Resolve every search path, dropping the ones that cannot be resolved.
pub fn expand_search_paths(search_paths: &[SearchPath], app_name: &str) -> Vec<PathBuf> {
    search_paths
        .iter()
        .filter_map(|sp| {
            let dir = resolve_search_path(sp, app_name);
            if dir.is_none() {
                tracing::debug!(search_path = ?sp, "search path unresolved");
            }
            dir
        })
        .collect()
}

/// Find config files named `file_name` across the search paths.
pub fn discover_config_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
    mode: SearchMode,
) -> Result<Vec<PathBuf>, ClapbindError> {
    let dirs = expand_search_paths(search_paths, app_name);

    let found = match mode {
        SearchMode::Merge => find_all(&dirs, file_name)?,
        SearchMode::FirstMatch => find_first_match(&dirs, file_name)?,
    };
    tracing::debug!(files = ?found, "config files discovered");
    Ok(found)
}

fn find_all(dirs: &[PathBuf], file_name: &str) -> Result<Vec<PathBuf>, ClapbindError> {
    let mut results = Vec::new();
    for dir in dirs {
        let file_path = dir.join(file_name);
        if exists(&file_path)? {
            results.push(file_path);
        }
    }
    Ok(results)
}

/// Searches from the end of the directory list (highest priority) backward.
fn find_first_match(dirs: &[PathBuf], file_name: &str) -> Result<Vec<PathBuf>, ClapbindError> {
    for dir in dirs.iter().rev() {
        let file_path = dir.join(file_name);
        if exists(&file_path)? {
            return Ok(vec![file_path]);
        }
    }
    Ok(vec![])
}

fn exists(path: &Path) -> Result<bool, ClapbindError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ClapbindError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
