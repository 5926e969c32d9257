//! Directory watch: feeds newly created eCAR files to a [`FileHandler`].
//!
//! Filesystem events arrive on notify's thread and are queued on a tokio
//! channel. The loop drains the queue one file at a time, so a file is fully
//! converted and loaded before the next one starts.
//!
//! A file is announced when it is created, which may be before its producer
//! has finished writing it. Each queued file is held until its size stops
//! changing for [`SETTLE_INTERVAL`]. A producer that pauses for longer than
//! that mid-write can still be picked up early; such files fail and are not
//! retried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ecargraph_core::Error;
use ecargraph_ingest::is_ingestible;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::pipeline::FileHandler;

const QUEUE_CAPACITY: usize = 512;

/// How long a file's size must stay unchanged before it is processed.
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(250);

/// Errors setting up a watch.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("file watcher init failed: {0}")]
    Init(String),

    #[error("watch failed for {}: {reason}", path.display())]
    Watch { path: PathBuf, reason: String },
}

/// Counters for a finished watch session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub processed: usize,
    pub failed: usize,
}

/// The paths worth queuing from one notify event.
///
/// Only creations of `.json` / `.json.gz` files count.
pub fn ingestible_creations(event: &Event) -> Vec<PathBuf> {
    if !matches!(event.kind, EventKind::Create(_)) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|p| is_ingestible(p))
        .cloned()
        .collect()
}

/// Wait until `path` stops growing: two size reads `interval` apart agree.
///
/// A missing file counts as settled; the handler reports it. Returns early
/// if `cancel` fires.
pub async fn wait_until_settled(path: &Path, interval: Duration, cancel: &CancellationToken) {
    let mut last = file_len(path).await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
        let now = file_len(path).await;
        if now == last {
            return;
        }
        debug!(file = %path.display(), size = ?now, "Still being written");
        last = now;
    }
}

async fn file_len(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|m| m.len())
}

/// A live watch on one directory.
pub struct DirWatcher {
    dir: PathBuf,
    rx: mpsc::Receiver<PathBuf>,
    // Dropping the watcher ends the event stream.
    _watcher: RecommendedWatcher,
}

impl DirWatcher {
    /// Start watching `dir` (non-recursively).
    pub fn start(dir: &Path) -> Result<Self, WatchError> {
        if !dir.is_dir() {
            return Err(WatchError::NotADirectory(dir.to_path_buf()));
        }

        let (tx, rx) = mpsc::channel::<PathBuf>(QUEUE_CAPACITY);

        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for path in ingestible_creations(&event) {
                        let _ = tx.blocking_send(path);
                    }
                }
                Err(e) => warn!(error = %e, "Watch error"),
            })
            .map_err(|e| WatchError::Init(e.to_string()))?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Watch {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
        info!(path = %dir.display(), "Watching");

        Ok(Self {
            dir: dir.to_path_buf(),
            rx,
            _watcher: watcher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Process created files until `cancel` fires.
    pub async fn run(self, handler: &dyn FileHandler, cancel: &CancellationToken) -> WatchSummary {
        process_queue(self.rx, handler, cancel).await
    }
}

/// Drain `queue` strictly in order, one file at a time.
///
/// A failing file is logged and counted; the loop moves on to the next
/// event. Cancellation, or the queue closing, ends the loop.
pub async fn process_queue(
    mut queue: mpsc::Receiver<PathBuf>,
    handler: &dyn FileHandler,
    cancel: &CancellationToken,
) -> WatchSummary {
    let mut summary = WatchSummary::default();

    loop {
        let path = tokio::select! {
            _ = cancel.cancelled() => break,
            next = queue.recv() => match next {
                Some(path) => path,
                None => break,
            },
        };

        wait_until_settled(&path, SETTLE_INTERVAL, cancel).await;
        if cancel.is_cancelled() {
            break;
        }

        info!(file = %path.display(), "Adding file");
        match handler.handle(&path, cancel).await {
            Ok(outcome) => {
                summary.processed += 1;
                debug!(
                    file = %path.display(),
                    emitted = outcome.conversion.stats.emitted,
                    loaded = outcome.load.is_some(),
                    "File done"
                );
            }
            Err(Error::Cancelled) => {
                info!(file = %path.display(), "Stopped while processing");
                break;
            }
            Err(e) => {
                summary.failed += 1;
                error!(file = %path.display(), error = %e, "File failed");
            }
        }
    }

    info!(
        processed = summary.processed,
        failed = summary.failed,
        "Watch stopped"
    );
    summary
}
