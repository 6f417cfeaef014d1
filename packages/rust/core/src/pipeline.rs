//! Sequential plugin pipeline.
//!
//! Plugins run one at a time, in list order, each receiving the shared value
//! and the builder. A plugin's returned future resolving is its completion
//! signal; the next plugin does not start until then. The first error stops
//! the pipeline. Mutations made before the failure are kept.
//!
//! There is no timeout: a plugin that never completes stalls the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use eloquent_shared::{EloquentError, FileDictionary, PluginError, Result};

use crate::builder::Eloquent;

/// What a plugin reports when it finishes.
pub type PluginResult = std::result::Result<(), PluginError>;

/// A transform step over the threaded value (the file dictionary by default).
#[async_trait]
pub trait Plugin<T: Send = FileDictionary>: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Mutate `files` in place. May suspend on its own asynchronous work.
    async fn run(&self, files: &mut T, eloquent: &Eloquent) -> PluginResult;
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Thread `files` through `plugins` and hand the result back.
pub async fn run_plugins<T: Send>(
    mut files: T,
    plugins: &[Arc<dyn Plugin<T>>],
    eloquent: &Eloquent,
) -> Result<T> {
    run_plugins_in_place(&mut files, plugins, eloquent).await?;
    Ok(files)
}

/// Run `plugins` over `files` in place.
///
/// On failure `files` keeps whatever the plugins had done to it so far.
#[instrument(skip_all, fields(plugins = plugins.len()))]
pub async fn run_plugins_in_place<T: Send>(
    files: &mut T,
    plugins: &[Arc<dyn Plugin<T>>],
    eloquent: &Eloquent,
) -> Result<()> {
    for (index, plugin) in plugins.iter().enumerate() {
        debug!(index, plugin = plugin.name(), "running plugin");

        if let Err(err) = plugin.run(files, eloquent).await {
            warn!(index, plugin = plugin.name(), error = %err, "plugin failed");
            if err.is::<DoneDropped>() {
                return Err(EloquentError::Unsignaled {
                    plugin: plugin.name().to_string(),
                });
            }
            return Err(EloquentError::Plugin(err));
        }
    }

    info!("pipeline completed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Closure adaptors
// ---------------------------------------------------------------------------

/// Plugin built from a synchronous closure. See [`plugin_fn`].
pub struct FnPlugin<F> {
    name: String,
    f: F,
}

/// Wrap a synchronous closure as a plugin.
pub fn plugin_fn<T, F>(f: F) -> FnPlugin<F>
where
    T: Send,
    F: Fn(&mut T, &Eloquent) -> PluginResult + Send + Sync,
{
    FnPlugin {
        name: std::any::type_name::<F>().to_string(),
        f,
    }
}

impl<F> FnPlugin<F> {
    /// Override the name reported in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl<T, F> Plugin<T> for FnPlugin<F>
where
    T: Send,
    F: Fn(&mut T, &Eloquent) -> PluginResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, files: &mut T, eloquent: &Eloquent) -> PluginResult {
        (self.f)(files, eloquent)
    }
}

/// Single-use completion handle given to callback-style plugins.
///
/// Consuming it with [`Done::ok`] or [`Done::fail`] resumes the pipeline.
/// It may be moved to another task and signalled later.
#[derive(Debug)]
pub struct Done {
    tx: oneshot::Sender<PluginResult>,
}

impl Done {
    /// Signal success.
    pub fn ok(self) {
        self.signal(Ok(()));
    }

    /// Signal failure with `err`.
    pub fn fail(self, err: impl Into<PluginError>) {
        self.signal(Err(err.into()));
    }

    /// Signal an already-built result.
    pub fn signal(self, result: PluginResult) {
        // The receiver only goes away if the pipeline itself was dropped.
        let _ = self.tx.send(result);
    }
}

/// Marker error for a [`Done`] dropped without a signal.
#[derive(Debug, thiserror::Error)]
#[error("completion handle dropped without a signal")]
struct DoneDropped;

/// Plugin built from a callback-style closure. See [`plugin_callback`].
pub struct CallbackPlugin<F> {
    name: String,
    f: F,
}

/// Wrap a closure that signals completion through a [`Done`] handle.
pub fn plugin_callback<T, F>(f: F) -> CallbackPlugin<F>
where
    T: Send,
    F: Fn(&mut T, &Eloquent, Done) + Send + Sync,
{
    CallbackPlugin {
        name: std::any::type_name::<F>().to_string(),
        f,
    }
}

impl<F> CallbackPlugin<F> {
    /// Override the name reported in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl<T, F> Plugin<T> for CallbackPlugin<F>
where
    T: Send,
    F: Fn(&mut T, &Eloquent, Done) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, files: &mut T, eloquent: &Eloquent) -> PluginResult {
        let (tx, rx) = oneshot::channel();
        (self.f)(files, eloquent, Done { tx });
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(Box::new(DoneDropped)),
        }
    }
}
