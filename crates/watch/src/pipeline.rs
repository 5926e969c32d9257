//! What happens to one file: convert it, then bulk-load the result.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ecargraph_core::{Error, FilterSpec, Result};
use ecargraph_graph::{LiveLoader, LoadReport};
use ecargraph_ingest::{Conversion, convert_file};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Processes one source file. Implementations must finish (or fail) before
/// returning; the watch loop relies on that to keep files serial.
#[async_trait]
pub trait FileHandler: Send + Sync {
    async fn handle(&self, path: &Path, cancel: &CancellationToken) -> Result<Outcome>;
}

/// Result of handling one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub conversion: Conversion,
    /// `None` when nothing was emitted and the load was skipped.
    pub load: Option<LoadReport>,
}

/// Convert a file on a blocking thread, then hand the output to the loader.
#[derive(Debug, Clone)]
pub struct ConvertAndLoad {
    filter: Option<FilterSpec>,
    loader: LiveLoader,
}

impl ConvertAndLoad {
    pub fn new(filter: Option<FilterSpec>, loader: LiveLoader) -> Self {
        Self { filter, loader }
    }

    /// Convert only; shared by the watch loop and the CLI.
    pub async fn convert(&self, path: &Path, cancel: &CancellationToken) -> Result<Conversion> {
        convert_blocking(path.to_path_buf(), self.filter.clone(), cancel.clone()).await
    }
}

#[async_trait]
impl FileHandler for ConvertAndLoad {
    async fn handle(&self, path: &Path, cancel: &CancellationToken) -> Result<Outcome> {
        let conversion = self.convert(path, cancel).await?;

        if conversion.stats.emitted == 0 {
            info!(file = %path.display(), "No records accepted, skipping load");
            return Ok(Outcome {
                conversion,
                load: None,
            });
        }

        let load = self.loader.load(&conversion.output, cancel).await?;
        Ok(Outcome {
            conversion,
            load: Some(load),
        })
    }
}

/// Run the synchronous driver without stalling the runtime.
pub async fn convert_blocking(
    path: PathBuf,
    filter: Option<FilterSpec>,
    cancel: CancellationToken,
) -> Result<Conversion> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || convert_file(&task_path, filter.as_ref(), &cancel))
        .await
        .map_err(|e| Error::io(path, std::io::Error::other(e)))?
}
