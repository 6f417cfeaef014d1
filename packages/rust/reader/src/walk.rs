//! Recursive enumeration of regular files under a root directory.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use walkdir::WalkDir;

use eloquent_shared::{EloquentError, Result};

use crate::ignore::IgnoreSet;

/// Enumerate every regular file under `root`, skipping ignored entries.
///
/// Runs the blocking walk on tokio's blocking pool. Paths come back
/// absolute when `root` is absolute, in file-name order per directory.
pub async fn walk(root: &Path, ignores: &IgnoreSet) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();
    let ignores = ignores.clone();
    tokio::task::spawn_blocking(move || walk_blocking(&root, &ignores))
        .await
        .map_err(|e| EloquentError::Task(e.to_string()))?
}

/// Synchronous walk used by [`walk`].
///
/// Ignored directories are pruned, so nothing beneath them is visited.
/// Symlinks are followed; a loop or a dangling link fails the walk.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn walk_blocking(root: &Path, ignores: &IgnoreSet) -> Result<Vec<PathBuf>> {
    let entries = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            !ignores.is_ignored(entry.path(), relative, entry.file_type().is_dir())
        });

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            EloquentError::read(path, e.into())
        })?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }

    debug!(count = paths.len(), "walk finished");
    Ok(paths)
}
