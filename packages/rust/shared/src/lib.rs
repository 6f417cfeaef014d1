//! Shared types, error model, and configuration for Eloquent.
//!
//! This crate is the foundation depended on by all other Eloquent crates.
//! It provides:
//! - [`EloquentError`] - the unified error type
//! - Domain types ([`FileRecord`], [`FileDictionary`], [`Concurrency`], [`Metadata`])
//! - Lexical path resolution ([`paths`])
//! - Configuration ([`BuilderConfig`], config loading)

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    BuilderConfig, CONFIG_FILE_NAME, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{EloquentError, PluginError, Result};
pub use types::{Concurrency, FileDictionary, FileRecord, LINE_ENDING, Metadata};
