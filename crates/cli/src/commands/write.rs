//! `ecargraph write`: Convert one file to RDF triples without loading it.

use std::path::{Path, PathBuf};

use ecargraph_core::Error;
use ecargraph_ingest::{Conversion, SourceKind, convert_file_to, is_same_file, output_path};

use super::{Context, resolve_filter};

pub async fn run(
    ctx: &Context,
    file: &Path,
    only: Option<&str>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = resolve_filter(only, &ctx.config)?;
    let output = plan_output(file, output)?;

    let source = file.to_path_buf();
    let cancel = ctx.cancel.clone();
    let task_output = output.clone();
    let conversion = tokio::task::spawn_blocking(move || {
        convert_file_to(&source, &task_output, filter.as_ref(), &cancel)
    })
    .await
    .map_err(|e| Error::io(&output, std::io::Error::other(e)))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversion.stats)?);
    } else {
        print_summary(&conversion);
    }
    Ok(())
}

/// Pick the output path and refuse anything that would clobber the source.
fn plan_output(file: &Path, output: Option<PathBuf>) -> ecargraph_core::Result<PathBuf> {
    if SourceKind::from_path(file).is_none() {
        return Err(Error::config(format!(
            "{} is not a .json or .json.gz file",
            file.display()
        )));
    }

    let output = output.unwrap_or_else(|| output_path(file));
    if output == file || is_same_file(file, &output) {
        return Err(Error::config(format!(
            "output {} would overwrite the source",
            output.display()
        )));
    }
    Ok(output)
}

fn print_summary(conversion: &Conversion) {
    let stats = &conversion.stats;
    println!("Wrote {}", conversion.output.display());
    println!("  Source:    {} ({})", conversion.source.display(), conversion.kind);
    println!("  Lines:     {}", stats.lines);
    println!("  Records:   {}", stats.emitted);
    println!("  Filtered:  {}", stats.filtered);
    println!("  Triples:   {}", stats.triples);
    println!(
        "  Declared:  {} actors, {} objects",
        stats.actors_declared, stats.objects_declared
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_sits_beside_source() {
        let out = plan_output(Path::new("logs/events.json.gz"), None).unwrap();
        assert_eq!(out, PathBuf::from("logs/events.json.gz.txt"));
    }

    #[test]
    fn explicit_output_is_kept() {
        let out = plan_output(Path::new("events.json"), Some("triples.rdf".into())).unwrap();
        assert_eq!(out, PathBuf::from("triples.rdf"));
    }

    #[test]
    fn unsupported_suffix_is_rejected() {
        let err = plan_output(Path::new("events.csv"), None).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn output_cannot_be_the_source() {
        let err = plan_output(Path::new("events.json"), Some("events.json".into())).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn output_cannot_alias_the_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let source = dir.path().join("events.json");
        std::fs::write(&source, "{}\n").unwrap();

        let alias = dir.path().join("sub").join("..").join("events.json");
        let err = plan_output(&source, Some(alias)).unwrap_err();
        assert!(err.is_config());
        assert_eq!(std::fs::read_to_string(&source).unwrap(), "{}\n");
    }
}
