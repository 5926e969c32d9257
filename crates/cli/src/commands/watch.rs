//! `ecargraph watch`: Ingest new files in a directory until interrupted.

use std::path::{Path, PathBuf};

use ecargraph_config::AppConfig;
use ecargraph_graph::{DgraphHttpAdmin, LiveLoader};
use ecargraph_watch::{ConvertAndLoad, DirWatcher};
use tracing::info;

use super::{Context, resolve_filter, schema};

pub async fn run(
    ctx: &Context,
    dir: Option<PathBuf>,
    only: Option<&str>,
    setup: bool,
    drop: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = resolve_filter(only, &ctx.config)?;
    let dir = watch_dir(dir, &ctx.config, &std::env::current_dir()?);

    if drop || setup || ctx.config.watch.setup {
        let admin = DgraphHttpAdmin::from_config(&ctx.config)?;
        if drop {
            schema::drop_all(&admin).await?;
        }
        if setup || ctx.config.watch.setup {
            schema::apply_schema(&admin).await?;
        }
    }

    let watcher = DirWatcher::start(&dir)?;
    let pipeline = ConvertAndLoad::new(filter, LiveLoader::from_config(&ctx.config));
    println!("Watching {} (Ctrl-C to stop)", watcher.dir().display());

    let summary = watcher.run(&pipeline, &ctx.cancel).await;
    info!(
        processed = summary.processed,
        failed = summary.failed,
        "Watch finished"
    );
    println!(
        "Processed {} files, {} failed",
        summary.processed, summary.failed
    );
    Ok(())
}

/// `--dir`, then `watch.dir` from the config, then the working directory.
fn watch_dir(flag: Option<PathBuf>, config: &AppConfig, cwd: &Path) -> PathBuf {
    flag.or_else(|| config.watch.dir.clone())
        .unwrap_or_else(|| cwd.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_then_config_then_cwd() {
        let mut config = AppConfig::default();
        let cwd = Path::new("/work");

        assert_eq!(watch_dir(None, &config, cwd), PathBuf::from("/work"));

        config.watch.dir = Some("/var/log/ecar".into());
        assert_eq!(watch_dir(None, &config, cwd), PathBuf::from("/var/log/ecar"));

        assert_eq!(
            watch_dir(Some("/tmp/drop".into()), &config, cwd),
            PathBuf::from("/tmp/drop")
        );
    }
}
