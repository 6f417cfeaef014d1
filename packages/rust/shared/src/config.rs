//! Project configuration for Eloquent.
//!
//! An optional `eloquent.toml` at the root directory seeds the builder.
//! Builder setters applied afterwards override file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EloquentError, Result};
use crate::types::{Concurrency, Metadata};

/// Default configuration file name, looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "eloquent.toml";

/// Builder configuration, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Source directory, relative to the root directory.
    #[serde(default = "default_source")]
    pub source: String,

    /// Maximum files read at once. Omitted means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Names, paths, or globs to skip while walking.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Global metadata exposed to plugins.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            concurrency: None,
            ignore: Vec::new(),
            metadata: Metadata::new(),
        }
    }
}

fn default_source() -> String {
    ".".into()
}

impl BuilderConfig {
    /// Resolve the configured read limit, rejecting zero.
    pub fn concurrency(&self) -> Result<Concurrency> {
        match self.concurrency {
            None => Ok(Concurrency::Unbounded),
            Some(max) => Concurrency::limited(max),
        }
    }

    /// Check the values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.source.is_empty() {
            return Err(EloquentError::config("source must not be empty"));
        }
        self.concurrency()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path to the config file under `root`.
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the config for `root`. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<BuilderConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(BuilderConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<BuilderConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EloquentError::io(path, e))?;

    let config: BuilderConfig = toml::from_str(&content).map_err(|e| {
        EloquentError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Write a default config file into `root`. Returns the path written.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root).map_err(|e| EloquentError::io(root, e))?;

    let path = config_file_path(root);
    let content = toml::to_string_pretty(&BuilderConfig::default())
        .map_err(|e| EloquentError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EloquentError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let toml_str = toml::to_string_pretty(&BuilderConfig::default()).expect("serialize");
        let parsed: BuilderConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed, BuilderConfig::default());
        assert_eq!(parsed.concurrency().unwrap(), Concurrency::Unbounded);
    }

    #[test]
    fn config_with_all_sections() {
        let toml_str = r#"
source = "src"
concurrency = 8
ignore = [".git", "*.tmp"]

[metadata]
title = "Docs"
"#;
        let config: BuilderConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.source, "src");
        assert_eq!(config.concurrency().unwrap().get(), Some(8));
        assert_eq!(config.ignore, vec![".git", "*.tmp"]);
        assert_eq!(config.metadata["title"], "Docs");
    }

    #[test]
    fn zero_concurrency_fails_validation() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "concurrency = 0\n").unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn empty_source_fails_validation() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "source = \"\"\n").unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert_eq!(err.code(), "invalid_config");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), BuilderConfig::default());
    }

    #[test]
    fn init_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = init_config(tmp.path()).unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));
        assert_eq!(load_config(tmp.path()).unwrap(), BuilderConfig::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "source = [").unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert_eq!(err.code(), "invalid_config");
    }
}
