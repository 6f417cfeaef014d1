//! Lexical path resolution used by the builder and the reader.
//!
//! Nothing here touches the filesystem except [`absolutize`], which needs the
//! current working directory for relative input.

use std::path::{Component, Path, PathBuf};

use crate::error::{EloquentError, Result};

/// Collapse `.` and `..` components without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` above the root stays at the root.
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Make `path` absolute against the current working directory, normalized.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let absolute = std::path::absolute(path).map_err(|e| EloquentError::io(path, e))?;
    Ok(normalize(&absolute))
}

/// Resolve `segments` from `base`, right-most absolute segment winning.
pub fn resolve<P: AsRef<Path>>(base: &Path, segments: &[P]) -> PathBuf {
    let mut out = base.to_path_buf();
    for segment in segments {
        // `push` replaces the buffer when the segment is absolute.
        out.push(segment.as_ref());
    }
    normalize(&out)
}

/// Dictionary key for `path`: relative to `root`, native separators.
pub fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("/site/./src/../docs/a.md")),
            PathBuf::from("/site/docs/a.md")
        );
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
    }

    #[test]
    fn resolve_joins_segments() {
        let base = Path::new("/site");
        assert_eq!(resolve(base, &["a", "b"]), PathBuf::from("/site/a/b"));
        assert_eq!(resolve(base, &["a", "/abs", "c"]), PathBuf::from("/abs/c"));
        assert_eq!(resolve::<&str>(base, &[]), PathBuf::from("/site"));
    }

    #[test]
    fn absolutize_relative_uses_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new("x/../y")).unwrap(), normalize(&cwd.join("y")));
        assert_eq!(absolutize(Path::new(".")).unwrap(), normalize(&cwd));
    }

    #[test]
    fn relative_key_strips_root() {
        let key = relative_key(Path::new("/site"), Path::new("/site/src/index.md"));
        assert_eq!(PathBuf::from(key), PathBuf::from("src").join("index.md"));
    }
}
