//! Batched, concurrency-bounded reading of a directory tree.
//!
//! Paths from the walker are split into batches of `concurrency` entries.
//! Files inside a batch are read concurrently; batch N+1 starts only after
//! every read of batch N has completed. The first failure aborts the read.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use eloquent_shared::{Concurrency, EloquentError, FileDictionary, FileRecord, Result, paths};

use crate::ignore::{Ignore, IgnoreSet};
use crate::walk::walk;

// ---------------------------------------------------------------------------
// ReadOptions
// ---------------------------------------------------------------------------

/// Options for [`read_dir`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Maximum files read at once.
    pub concurrency: Concurrency,
    /// Entries to skip while walking.
    pub ignores: Vec<Ignore>,
}

/// Progress callback for reporting read status.
pub trait ReadProgress: Send + Sync {
    /// Called once the walk has produced `total` paths.
    fn walked(&self, total: usize);
    /// Called after each batch, with the running count of files read.
    fn batch_read(&self, read: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ReadProgress for SilentProgress {
    fn walked(&self, _total: usize) {}
    fn batch_read(&self, _read: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read one file into a [`FileRecord`].
pub async fn read_file(path: &Path) -> Result<FileRecord> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EloquentError::read(path, e))?;
    Ok(FileRecord::from_bytes(bytes))
}

/// Read every file under `dir` into a [`FileDictionary`].
pub async fn read_dir(dir: &Path, options: &ReadOptions) -> Result<FileDictionary> {
    read_dir_with_progress(dir, options, &SilentProgress).await
}

/// [`read_dir`] with a progress reporter.
#[instrument(skip_all, fields(dir = %dir.display(), concurrency = %options.concurrency))]
pub async fn read_dir_with_progress(
    dir: &Path,
    options: &ReadOptions,
    progress: &dyn ReadProgress,
) -> Result<FileDictionary> {
    let start = Instant::now();
    let root = paths::absolutize(dir)?;

    let metadata = tokio::fs::metadata(&root)
        .await
        .map_err(|e| EloquentError::read(&root, e))?;
    if !metadata.is_dir() {
        return Err(EloquentError::read(
            &root,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }

    let ignores = IgnoreSet::new(&options.ignores)?;
    let paths = walk(&root, &ignores).await?;
    progress.walked(paths.len());

    let records = read_batched(&paths, options.concurrency, progress).await?;

    let files: FileDictionary = paths
        .iter()
        .zip(records)
        .map(|(path, record)| (paths::relative_key(&root, path), record))
        .collect();

    info!(
        files = files.len(),
        duration_ms = start.elapsed().as_millis(),
        "read completed"
    );
    Ok(files)
}

/// Read `paths` in sequential batches, returning records in input order.
async fn read_batched(
    paths: &[PathBuf],
    concurrency: Concurrency,
    progress: &dyn ReadProgress,
) -> Result<Vec<FileRecord>> {
    let batch_size = concurrency.batch_size(paths.len());
    let mut records = Vec::with_capacity(paths.len());

    for (batch_index, batch) in paths.chunks(batch_size).enumerate() {
        debug!(batch = batch_index, size = batch.len(), "reading batch");
        records.extend(read_batch(batch).await?);
        progress.batch_read(records.len(), paths.len());
    }

    Ok(records)
}

/// Read one batch concurrently. Outstanding reads are aborted on failure.
async fn read_batch(batch: &[PathBuf]) -> Result<Vec<FileRecord>> {
    let mut set = JoinSet::new();
    for (index, path) in batch.iter().cloned().enumerate() {
        set.spawn(async move { (index, read_file(&path).await) });
    }

    let mut slots: Vec<Option<FileRecord>> = vec![None; batch.len()];
    while let Some(joined) = set.join_next().await {
        let (index, outcome) = joined.map_err(|e| EloquentError::Task(e.to_string()))?;
        // Returning drops `set`, which aborts the reads still in flight.
        slots[index] = Some(outcome?);
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| EloquentError::Task("read task vanished".into())))
        .collect()
}
