//! Builder and plugin pipeline for Eloquent.
//!
//! This crate ties the reader and the plugin executor together behind the
//! [`Eloquent`] builder: `process()` reads the source tree into a file
//! dictionary and threads it through the configured plugins.

pub mod builder;
pub mod message;
pub mod pipeline;

pub use builder::Eloquent;
pub use message::{MemorySink, Message, MessageSink, StdoutSink};
pub use pipeline::{
    CallbackPlugin, Done, FnPlugin, Plugin, PluginResult, plugin_callback, plugin_fn, run_plugins,
    run_plugins_in_place,
};

pub use eloquent_reader::{Ignore, ReadProgress};
pub use eloquent_shared::{
    BuilderConfig, Concurrency, EloquentError, FileDictionary, FileRecord, Metadata, PluginError,
    Result,
};
