//! Streaming conversion of eCAR audit logs into RDF triples.
//!
//! [`Driver`] runs one pass over any line source; [`convert_file`] wires it to
//! a `.json` or `.json.gz` file on disk and writes `<file>.txt` beside it.

pub mod driver;
pub mod source;

pub use driver::{Driver, IngestStats, run};
pub use source::{
    Conversion, SourceKind, convert_file, convert_file_to, is_ingestible, is_same_file, open_source,
    output_path,
};
