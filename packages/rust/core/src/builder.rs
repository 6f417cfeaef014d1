//! The `Eloquent` builder: configuration plus the read → run orchestration.
//!
//! Plugins receive `&Eloquent` while they run. They can read configuration
//! and report diagnostics through [`Eloquent::print_message`], but cannot
//! reconfigure the builder mid-pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use eloquent_reader::{Ignore, IgnoreSet, ReadOptions, ReadProgress, SilentProgress};
use eloquent_shared::{
    BuilderConfig, Concurrency, EloquentError, FileDictionary, FileRecord, Metadata, Result,
    load_config, paths,
};

use crate::message::{Message, MessageSink, StdoutSink};
use crate::pipeline::{self, Plugin};

/// Builder owning the configuration of one processing run.
pub struct Eloquent {
    directory: PathBuf,
    source: PathBuf,
    metadata: Metadata,
    concurrency: Concurrency,
    ignores: Vec<Ignore>,
    plugins: Vec<Arc<dyn Plugin>>,
    sink: Arc<dyn MessageSink>,
    progress: Arc<dyn ReadProgress>,
}

impl fmt::Debug for Eloquent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eloquent")
            .field("directory", &self.directory)
            .field("source", &self.source)
            .field("metadata", &self.metadata)
            .field("concurrency", &self.concurrency)
            .field("ignores", &self.ignores)
            .field("plugins", &self.plugins.len())
            .finish_non_exhaustive()
    }
}

impl Eloquent {
    /// Create a builder rooted at `directory` (resolved to an absolute path).
    ///
    /// Defaults: source `.`, empty metadata, unbounded concurrency, no
    /// ignores, no plugins, diagnostics to stdout.
    pub fn new(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        if directory.as_os_str().is_empty() {
            return Err(EloquentError::config("you must pass a working directory path"));
        }

        Ok(Self {
            directory: paths::absolutize(directory)?,
            source: PathBuf::from("."),
            metadata: Metadata::new(),
            concurrency: Concurrency::Unbounded,
            ignores: Vec::new(),
            plugins: Vec::new(),
            sink: Arc::new(StdoutSink),
            progress: Arc::new(SilentProgress),
        })
    }

    /// Create a builder and apply `eloquent.toml` from `directory` if present.
    pub fn from_root(directory: impl AsRef<Path>) -> Result<Self> {
        let mut eloquent = Self::new(directory)?;
        let config = load_config(&eloquent.directory)?;
        eloquent.configure(&config)?;
        Ok(eloquent)
    }

    /// Apply a loaded config. Everything is validated before anything changes.
    pub fn configure(&mut self, config: &BuilderConfig) -> Result<&mut Self> {
        config.validate()?;
        let concurrency = config.concurrency()?;
        let ignores: Vec<Ignore> = config.ignore.iter().map(Ignore::from).collect();
        IgnoreSet::new(&ignores)?;

        self.source = PathBuf::from(&config.source);
        self.concurrency = concurrency;
        self.ignores.extend(ignores);
        self.metadata = config.metadata.clone();
        Ok(self)
    }

    // -----------------------------------------------------------------------
    // Configuration accessors
    // -----------------------------------------------------------------------

    /// Absolute root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Change the root directory. Relative paths resolve against the cwd.
    pub fn set_directory(&mut self, directory: impl AsRef<Path>) -> Result<&mut Self> {
        let directory = directory.as_ref();
        if directory.as_os_str().is_empty() {
            return Err(EloquentError::config("you must pass a directory path"));
        }
        self.directory = paths::absolutize(directory)?;
        Ok(self)
    }

    /// Global metadata exposed to plugins.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Replace the metadata with a copy of `metadata`, which must be an object.
    pub fn set_metadata(&mut self, metadata: &Value) -> Result<&mut Self> {
        let Value::Object(map) = metadata else {
            return Err(EloquentError::config(format!(
                "you must pass a metadata object, got {}",
                kind_of(metadata)
            )));
        };
        self.metadata = map.clone();
        Ok(self)
    }

    /// Absolute source directory (resolved under the root directory).
    pub fn source(&self) -> PathBuf {
        self.path(&[&self.source])
    }

    /// Change the source directory, relative to the root directory.
    pub fn set_source(&mut self, source: impl AsRef<Path>) -> Result<&mut Self> {
        let source = source.as_ref();
        if source.as_os_str().is_empty() {
            return Err(EloquentError::config("you must pass a source directory path"));
        }
        self.source = source.to_path_buf();
        Ok(self)
    }

    /// Maximum number of files read at once.
    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// Limit reads to `max` files at once. Zero is rejected.
    pub fn set_concurrency(&mut self, max: usize) -> Result<&mut Self> {
        self.concurrency = Concurrency::limited(max)?;
        Ok(self)
    }

    /// Read every file in a single batch (the default).
    pub fn set_unbounded_concurrency(&mut self) -> &mut Self {
        self.concurrency = Concurrency::Unbounded;
        self
    }

    /// Copy of the ignore list.
    pub fn ignores(&self) -> Vec<Ignore> {
        self.ignores.clone()
    }

    /// Append entries to the ignore list. Invalid globs are rejected.
    pub fn ignore<I>(&mut self, ignores: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Ignore>,
    {
        let ignores: Vec<Ignore> = ignores.into_iter().map(Into::into).collect();
        IgnoreSet::new(&ignores)?;
        self.ignores.extend(ignores);
        Ok(self)
    }

    /// Append a plugin to the pipeline.
    pub fn use_plugin(&mut self, plugin: impl Plugin + 'static) -> &mut Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Append an already shared plugin to the pipeline.
    pub fn use_shared(&mut self, plugin: Arc<dyn Plugin>) -> &mut Self {
        self.plugins.push(plugin);
        self
    }

    /// The configured plugins, in run order.
    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// Send diagnostics to `sink` instead of stdout.
    pub fn set_message_sink(&mut self, sink: Arc<dyn MessageSink>) -> &mut Self {
        self.sink = sink;
        self
    }

    /// Report read progress to `progress`.
    pub fn set_read_progress(&mut self, progress: Arc<dyn ReadProgress>) -> &mut Self {
        self.progress = progress;
        self
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// Resolve `segments` relative to the root directory.
    pub fn path<P: AsRef<Path>>(&self, segments: &[P]) -> PathBuf {
        paths::resolve(&self.directory, segments)
    }

    /// Resolve `file` against the source directory unless already absolute.
    pub fn absolute_path(&self, file: impl AsRef<Path>) -> PathBuf {
        let file = file.as_ref();
        if file.is_absolute() {
            paths::normalize(file)
        } else {
            paths::resolve(&self.source(), &[file])
        }
    }

    // -----------------------------------------------------------------------
    // Orchestration
    // -----------------------------------------------------------------------

    /// Read a single file. Relative paths resolve against the source directory.
    pub async fn read_file(&self, file: impl AsRef<Path>) -> Result<FileRecord> {
        eloquent_reader::read_file(&self.absolute_path(file)).await
    }

    /// Read the source directory into a file dictionary.
    pub async fn read(&self) -> Result<FileDictionary> {
        self.read_dir(self.source()).await
    }

    /// Read `dir` (relative paths resolve against the root directory).
    ///
    /// Keys are relative to `dir`.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub async fn read_dir(&self, dir: impl AsRef<Path>) -> Result<FileDictionary> {
        let dir = self.path(&[dir.as_ref()]);
        let options = ReadOptions {
            concurrency: self.concurrency,
            ignores: self.ignores.clone(),
        };
        eloquent_reader::read_dir_with_progress(&dir, &options, self.progress.as_ref()).await
    }

    /// Run `files` through the configured plugins.
    pub async fn run(&self, files: FileDictionary) -> Result<FileDictionary> {
        pipeline::run_plugins(files, &self.plugins, self).await
    }

    /// Run `files` through the configured plugins in place.
    ///
    /// On failure `files` keeps the mutations made before the failing plugin.
    pub async fn run_in_place(&self, files: &mut FileDictionary) -> Result<()> {
        pipeline::run_plugins_in_place(files, &self.plugins, self).await
    }

    /// Run any value through an explicit plugin list.
    pub async fn run_with<T: Send>(&self, files: T, plugins: &[Arc<dyn Plugin<T>>]) -> Result<T> {
        pipeline::run_plugins(files, plugins, self).await
    }

    /// Read the source directory and run it through the plugins.
    #[instrument(skip_all, fields(plugins = self.plugins.len()))]
    pub async fn process(&self) -> Result<FileDictionary> {
        let files = self.read().await?;
        info!(files = files.len(), source = %self.source().display(), "processing files");
        self.run(files).await
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Report a positioned finding (1-based line and column).
    pub fn print_message(&self, file: &str, line: usize, column: usize, message: &str) {
        debug!(file, line, column, message, "plugin message");
        self.sink.emit(&Message {
            file: file.to_string(),
            line,
            column,
            text: message.to_string(),
        });
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
