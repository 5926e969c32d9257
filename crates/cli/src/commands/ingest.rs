//! `ecargraph ingest`: Convert a file, then bulk-load it.

use std::path::Path;

use ecargraph_graph::LiveLoader;
use ecargraph_watch::{ConvertAndLoad, FileHandler};

use super::{Context, resolve_filter};

pub async fn run(
    ctx: &Context,
    file: &Path,
    only: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = resolve_filter(only, &ctx.config)?;
    let pipeline = ConvertAndLoad::new(filter, LiveLoader::from_config(&ctx.config));

    let outcome = pipeline.handle(file, &ctx.cancel).await?;
    let stats = &outcome.conversion.stats;
    println!(
        "Converted {} → {} ({} records, {} triples)",
        outcome.conversion.source.display(),
        outcome.conversion.output.display(),
        stats.emitted,
        stats.triples
    );
    match outcome.load {
        Some(report) => println!("Loaded ({} loader lines)", report.stdout_lines),
        None => println!("Nothing to load"),
    }
    Ok(())
}
