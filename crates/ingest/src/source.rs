//! Source selection and file-to-file conversion.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use ecargraph_core::{Error, FilterSpec, Result};
use flate2::read::MultiGzDecoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::driver::{Driver, IngestStats};

const PLAIN_SUFFIX: &str = ".json";
const GZIP_SUFFIX: &str = ".json.gz";
const OUTPUT_SUFFIX: &str = ".txt";

/// How a source file is framed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Plain,
    Gzip,
}

impl SourceKind {
    /// Pick the framing from the file name: `.json` or `.json.gz`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(GZIP_SUFFIX) {
            Some(SourceKind::Gzip)
        } else if name.ends_with(PLAIN_SUFFIX) {
            Some(SourceKind::Plain)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Plain => "json",
            SourceKind::Gzip => "json.gz",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `path` names something the pipeline can convert.
pub fn is_ingestible(path: &Path) -> bool {
    SourceKind::from_path(path).is_some()
}

/// Open `path` as a line reader, decompressing gzip sources.
pub fn open_source(path: &Path, kind: SourceKind) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(match kind {
        SourceKind::Plain => Box::new(BufReader::new(file)),
        SourceKind::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(file))),
    })
}

/// Where the triples for `source` are written: `<source>.txt`.
pub fn output_path(source: &Path) -> PathBuf {
    let mut name = OsString::from(source.as_os_str());
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// Whether `a` and `b` name the same existing file, through any alias
/// (`..` segments, symlinks, hard links).
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b || same_inode(&a, &b),
        _ => false,
    }
}

#[cfg(unix)]
fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_inode(_: &Path, _: &Path) -> bool {
    false
}

/// The result of converting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub source: PathBuf,
    pub output: PathBuf,
    pub kind: SourceKind,
    pub stats: IngestStats,
}

/// Convert `source` into `<source>.txt`.
pub fn convert_file(
    source: &Path,
    filter: Option<&FilterSpec>,
    cancel: &CancellationToken,
) -> Result<Conversion> {
    convert_file_to(source, &output_path(source), filter, cancel)
}

/// Convert `source` into `output`, replacing any previous content.
///
/// Both files are closed when this returns, whether or not it succeeds.
/// An `output` that resolves to `source` is refused before anything is
/// opened for writing.
pub fn convert_file_to(
    source: &Path,
    output: &Path,
    filter: Option<&FilterSpec>,
    cancel: &CancellationToken,
) -> Result<Conversion> {
    let kind = SourceKind::from_path(source).ok_or_else(|| {
        Error::config(format!(
            "{} is not a {PLAIN_SUFFIX} or {GZIP_SUFFIX} file",
            source.display()
        ))
    })?;

    if is_same_file(source, output) {
        return Err(Error::config(format!(
            "output {} is the source file {}",
            output.display(),
            source.display()
        )));
    }

    let reader = open_source(source, kind)?;
    let file = File::create(output).map_err(|e| Error::io(output, e))?;
    let mut writer = BufWriter::new(file);

    debug!(
        source = %source.display(),
        output = %output.display(),
        kind = %kind,
        filter = ?filter.map(|f| f.to_string()),
        "Converting file"
    );

    let stats = Driver::new(filter)
        .with_cancel(cancel.clone())
        .with_names(source, output)
        .run(reader, &mut writer)?;

    info!(
        source = %source.display(),
        emitted = stats.emitted,
        filtered = stats.filtered,
        triples = stats.triples,
        "Conversion finished"
    );

    Ok(Conversion {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        kind,
        stats,
    })
}
