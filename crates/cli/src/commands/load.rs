//! `ecargraph load`: Hand an already converted file to the bulk loader.

use std::path::Path;

use ecargraph_core::Error;
use ecargraph_graph::LiveLoader;

use super::Context;

pub async fn run(ctx: &Context, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !file.is_file() {
        return Err(Error::config(format!("{} is not a file", file.display())).into());
    }

    let loader = LiveLoader::from_config(&ctx.config);
    let report = loader.load(file, &ctx.cancel).await?;
    println!(
        "Loaded {} ({} loader lines, {} warnings)",
        file.display(),
        report.stdout_lines,
        report.stderr_lines
    );
    Ok(())
}
