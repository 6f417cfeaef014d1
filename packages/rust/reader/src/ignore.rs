//! Ignore matchers applied while walking the source tree.
//!
//! A pattern without glob metacharacters matches a whole path segment (or the
//! whole relative path). A glob without `/` matches the entry's file name at
//! any depth; a glob with `/` matches the full relative path. Absolute
//! patterns are matched against the entry's absolute path instead: a plain
//! absolute path ignores that entry and everything beneath it.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use eloquent_shared::{EloquentError, Result, paths};

/// Custom matcher: `(relative_path, is_dir) -> ignored`.
pub type IgnorePredicate = Arc<dyn Fn(&Path, bool) -> bool + Send + Sync>;

const GLOB_CHARS: &[char] = &['*', '?', '[', '{'];

/// One entry of the ignore list.
#[derive(Clone)]
pub enum Ignore {
    /// Name, relative or absolute path, or glob.
    Pattern(String),
    /// Arbitrary test on the relative path.
    Predicate(IgnorePredicate),
}

impl Ignore {
    /// Wrap a closure as an ignore matcher.
    pub fn predicate(f: impl Fn(&Path, bool) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }
}

impl fmt::Debug for Ignore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Ignore {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl From<String> for Ignore {
    fn from(pattern: String) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<&String> for Ignore {
    fn from(pattern: &String) -> Self {
        Self::Pattern(pattern.clone())
    }
}

impl From<PathBuf> for Ignore {
    fn from(path: PathBuf) -> Self {
        Self::Pattern(path.to_string_lossy().into_owned())
    }
}

impl From<&Path> for Ignore {
    fn from(path: &Path) -> Self {
        Self::Pattern(path.to_string_lossy().into_owned())
    }
}

/// `path` with `/` separators, as globs expect.
fn slashed(path: &Path) -> String {
    let text = path.to_string_lossy();
    if cfg!(windows) {
        text.replace('\\', "/")
    } else {
        text.into_owned()
    }
}

/// Bring a raw pattern to `/` separators. Backslash is a glob escape off Windows.
fn separators(raw: &str) -> String {
    if cfg!(windows) {
        raw.replace('\\', "/")
    } else {
        raw.to_string()
    }
}

// ---------------------------------------------------------------------------
// IgnoreSet
// ---------------------------------------------------------------------------

/// Compiled form of an ignore list.
#[derive(Clone)]
pub struct IgnoreSet {
    names: Vec<String>,
    name_globs: GlobSet,
    path_globs: GlobSet,
    absolute_paths: Vec<PathBuf>,
    absolute_globs: GlobSet,
    predicates: Vec<IgnorePredicate>,
}

impl IgnoreSet {
    /// Compile `ignores`. Fails on an invalid glob.
    pub fn new(ignores: &[Ignore]) -> Result<Self> {
        let mut names = Vec::new();
        let mut name_globs = GlobSetBuilder::new();
        let mut path_globs = GlobSetBuilder::new();
        let mut absolute_paths = Vec::new();
        let mut absolute_globs = GlobSetBuilder::new();
        let mut predicates = Vec::new();

        for ignore in ignores {
            match ignore {
                Ignore::Predicate(p) => predicates.push(Arc::clone(p)),
                Ignore::Pattern(raw) => {
                    let pattern = separators(raw);
                    let pattern = match pattern.trim_end_matches('/') {
                        "" if pattern.starts_with('/') => "/",
                        trimmed => trimmed,
                    };
                    if pattern.is_empty() {
                        continue;
                    }
                    let absolute = Path::new(pattern).is_absolute();
                    if !pattern.contains(GLOB_CHARS) {
                        if absolute {
                            absolute_paths.push(paths::normalize(Path::new(pattern)));
                        } else {
                            names.push(pattern.to_string());
                        }
                        continue;
                    }
                    let glob = GlobBuilder::new(pattern)
                        .literal_separator(true)
                        .build()
                        .map_err(|e| {
                            EloquentError::config(format!("invalid ignore pattern '{raw}': {e}"))
                        })?;
                    if absolute {
                        absolute_globs.add(glob);
                    } else if pattern.contains('/') {
                        path_globs.add(glob);
                    } else {
                        name_globs.add(glob);
                    }
                }
            }
        }

        let build = |builder: GlobSetBuilder| {
            builder
                .build()
                .map_err(|e| EloquentError::config(format!("invalid ignore patterns: {e}")))
        };

        Ok(Self {
            names,
            name_globs: build(name_globs)?,
            path_globs: build(path_globs)?,
            absolute_paths,
            absolute_globs: build(absolute_globs)?,
            predicates,
        })
    }

    /// A set that ignores nothing.
    pub fn empty() -> Self {
        Self {
            names: Vec::new(),
            name_globs: GlobSet::empty(),
            path_globs: GlobSet::empty(),
            absolute_paths: Vec::new(),
            absolute_globs: GlobSet::empty(),
            predicates: Vec::new(),
        }
    }

    /// True when no matcher is configured.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.name_globs.is_empty()
            && self.path_globs.is_empty()
            && self.absolute_paths.is_empty()
            && self.absolute_globs.is_empty()
            && self.predicates.is_empty()
    }

    /// Whether the entry at `absolute` is ignored. `relative` is the same
    /// entry relative to the read root.
    pub fn is_ignored(&self, absolute: &Path, relative: &Path, is_dir: bool) -> bool {
        if self.is_empty() {
            return false;
        }

        if self.absolute_paths.iter().any(|p| absolute.starts_with(p))
            || self.absolute_globs.is_match(slashed(absolute))
        {
            return true;
        }

        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let joined = segments.join("/");

        if self
            .names
            .iter()
            .any(|name| *name == joined || segments.iter().any(|s| s == name))
        {
            return true;
        }

        if let Some(file_name) = segments.last() {
            if self.name_globs.is_match(file_name) {
                return true;
            }
        }

        if self.path_globs.is_match(&joined) {
            return true;
        }

        self.predicates.iter().any(|p| p(relative, is_dir))
    }
}

impl fmt::Debug for IgnoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreSet")
            .field("names", &self.names)
            .field("name_globs", &self.name_globs.len())
            .field("path_globs", &self.path_globs.len())
            .field("absolute_paths", &self.absolute_paths)
            .field("absolute_globs", &self.absolute_globs.len())
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> IgnoreSet {
        let ignores: Vec<Ignore> = patterns.iter().map(|p| Ignore::from(*p)).collect();
        IgnoreSet::new(&ignores).unwrap()
    }

    fn root() -> PathBuf {
        paths::absolutize(Path::new("site")).unwrap()
    }

    /// Check `relative` as if it were walked under [`root`].
    fn ignored(ignores: &IgnoreSet, relative: &str, is_dir: bool) -> bool {
        let relative = PathBuf::from_iter(relative.split('/'));
        ignores.is_ignored(&root().join(&relative), &relative, is_dir)
    }

    #[test]
    fn empty_set_ignores_nothing() {
        let ignores = IgnoreSet::empty();
        assert!(ignores.is_empty());
        assert!(!ignored(&ignores, "anything.md", false));
    }

    #[test]
    fn plain_name_matches_any_segment() {
        let ignores = set(&["drafts"]);
        assert!(ignored(&ignores, "drafts", true));
        assert!(ignored(&ignores, "posts/drafts/a.md", false));
        assert!(!ignored(&ignores, "posts/drafts.md", false));
    }

    #[test]
    fn plain_path_matches_whole_relative_path() {
        let ignores = set(&["posts/secret.md"]);
        assert!(ignored(&ignores, "posts/secret.md", false));
        assert!(!ignored(&ignores, "secret.md", false));
    }

    #[test]
    fn name_glob_matches_at_any_depth() {
        let ignores = set(&["*.tmp"]);
        assert!(ignored(&ignores, "a.tmp", false));
        assert!(ignored(&ignores, "deep/er/b.tmp", false));
        assert!(!ignored(&ignores, "a.md", false));
    }

    #[test]
    fn path_glob_matches_relative_path() {
        let ignores = set(&["assets/*.png"]);
        assert!(ignored(&ignores, "assets/logo.png", false));
        assert!(!ignored(&ignores, "assets/icons/logo.png", false));
        assert!(!ignored(&ignores, "logo.png", false));
    }

    #[test]
    fn absolute_path_matches_entry_and_descendants() {
        let ignores = IgnoreSet::new(&[Ignore::from(root().join("drafts"))]).unwrap();
        assert!(ignored(&ignores, "drafts", true));
        assert!(ignored(&ignores, "drafts/wip.md", false));
        assert!(!ignored(&ignores, "drafts.md", false));
        assert!(!ignored(&ignores, "posts/drafts", true));
    }

    #[test]
    fn absolute_glob_matches_absolute_path() {
        let pattern = format!("{}/posts/*.md", slashed(&root()));
        let ignores = set(&[pattern.as_str()]);
        assert!(ignored(&ignores, "posts/a.md", false));
        assert!(!ignored(&ignores, "posts/deep/a.md", false));
        assert!(!ignored(&ignores, "a.md", false));
    }

    #[cfg(not(windows))]
    #[test]
    fn backslash_escapes_glob_characters() {
        let ignores = set(&[r"draft\*.md"]);
        assert!(ignored(&ignores, "draft*.md", false));
        assert!(!ignored(&ignores, "draft1.md", false));
    }

    #[test]
    fn predicate_sees_relative_path_and_kind() {
        let ignores = IgnoreSet::new(&[Ignore::predicate(|path, is_dir| {
            !is_dir && path.extension().is_some_and(|ext| ext == "bak")
        })])
        .unwrap();
        assert!(ignored(&ignores, "x/y.bak", false));
        assert!(!ignored(&ignores, "y.bak", true));
    }

    #[test]
    fn invalid_glob_is_config_error() {
        let err = IgnoreSet::new(&[Ignore::from("[unclosed")]).unwrap_err();
        assert_eq!(err.code(), "invalid_config");
    }
}
