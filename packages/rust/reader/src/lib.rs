//! Directory walking and batched file reading.
//!
//! This crate provides:
//! - [`walk`] - recursive enumeration of regular files with ignore pruning
//! - [`ignore`] - name, path, glob, and predicate ignore matchers
//! - [`engine`] - concurrency-bounded batched reads into a [`FileDictionary`]
//!
//! [`FileDictionary`]: eloquent_shared::FileDictionary

pub mod engine;
pub mod ignore;
pub mod walk;

pub use engine::{ReadOptions, ReadProgress, SilentProgress, read_dir, read_dir_with_progress, read_file};
pub use ignore::{Ignore, IgnorePredicate, IgnoreSet};
pub use walk::{walk, walk_blocking};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    #[tokio::test]
    async fn reads_fixture_tree() {
        let files = read_dir(&fixture("read"), &ReadOptions::default())
            .await
            .expect("read fixture");

        let key = Path::new("src").join("index.md").to_string_lossy().into_owned();
        assert_eq!(files.len(), 1);
        assert_eq!(files[&key].contents, "body");
        assert_eq!(files[&key].lines, vec!["body"]);
    }
}
