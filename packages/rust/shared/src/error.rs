//! Error types for Eloquent.
//!
//! Library crates use [`EloquentError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Error value a plugin reports when it fails. Opaque to the pipeline.
pub type PluginError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for all Eloquent operations.
#[derive(Debug, thiserror::Error)]
pub enum EloquentError {
    /// Invalid builder configuration (rejected before any state changes).
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// A directory walk or file read failed. Aborts the whole `read`.
    #[error("failed to read the file at: {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem I/O error outside of reading the source tree.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The error a plugin signalled, passed through unchanged.
    #[error(transparent)]
    Plugin(PluginError),

    /// A plugin dropped its completion handle without signalling.
    #[error("plugin `{plugin}` finished without signalling completion")]
    Unsignaled { plugin: String },

    /// A spawned read task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EloquentError>;

impl EloquentError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a read failure with the offending path.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable, machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "invalid_config",
            Self::Read { .. } => "failed_read",
            Self::Io { .. } => "io_error",
            Self::Plugin(_) => "plugin_failed",
            Self::Unsignaled { .. } => "plugin_unsignaled",
            Self::Task(_) => "task_failed",
        }
    }
}

impl From<PluginError> for EloquentError {
    fn from(err: PluginError) -> Self {
        Self::Plugin(err)
    }
}
