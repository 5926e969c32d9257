//! Ingestion driver: runs parse → filter → emit over one stream.
//!
//! The driver owns a fresh [`IdentityTracker`] for every call to
//! [`Driver::run`], writes each record's block to the sink as soon as it is
//! produced, and stops at the first fatal condition.

use std::io::{BufRead, ErrorKind, Write};
use std::path::PathBuf;

use ecargraph_core::{AuditRecord, Error, FilterSpec, IdentityTracker, Result, TripleEmitter};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Counters for one stream pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Lines read, blank ones included
    pub lines: usize,
    /// Blank lines skipped
    pub blank: usize,
    /// Records rejected by the filter
    pub filtered: usize,
    /// Records converted to triples
    pub emitted: usize,
    /// Triples written
    pub triples: usize,
    /// Distinct actors declared
    pub actors_declared: usize,
    /// Distinct objects declared
    pub objects_declared: usize,
}

/// Converts a newline-delimited JSON stream into triples.
#[derive(Debug, Clone)]
pub struct Driver<'a> {
    filter: Option<&'a FilterSpec>,
    cancel: CancellationToken,
    source_name: PathBuf,
    sink_name: PathBuf,
    emitter: TripleEmitter,
}

impl<'a> Driver<'a> {
    pub fn new(filter: Option<&'a FilterSpec>) -> Self {
        Self {
            filter,
            cancel: CancellationToken::new(),
            source_name: PathBuf::from("<source>"),
            sink_name: PathBuf::from("<sink>"),
            emitter: TripleEmitter::new(),
        }
    }

    /// Stop before the next line once `cancel` fires.
    ///
    /// The token is only consulted between lines. A read that blocks inside
    /// the source (a stalled network mount, a pipe with no writer) is not
    /// interrupted; the run stops once that read returns.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Names used in I/O error messages.
    pub fn with_names(mut self, source: impl Into<PathBuf>, sink: impl Into<PathBuf>) -> Self {
        self.source_name = source.into();
        self.sink_name = sink.into();
        self
    }

    /// Consume `source` to the end, writing triples to `sink`.
    pub fn run<R: BufRead, W: Write>(&self, mut source: R, sink: &mut W) -> Result<IngestStats> {
        let mut tracker = IdentityTracker::new();
        let mut stats = IngestStats::default();
        let mut buf = String::new();

        loop {
            if self.cancel.is_cancelled() {
                debug!(line = stats.lines, "Ingestion cancelled");
                return Err(Error::Cancelled);
            }

            buf.clear();
            let read = source.read_line(&mut buf).map_err(|e| {
                if e.kind() == ErrorKind::InvalidData {
                    Error::MalformedInput {
                        line: stats.lines + 1,
                        reason: e.to_string(),
                    }
                } else {
                    Error::io(&self.source_name, e)
                }
            })?;
            if read == 0 {
                break;
            }
            stats.lines += 1;
            let line_no = stats.lines;

            let line = buf.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                stats.blank += 1;
                continue;
            }

            let record = AuditRecord::parse(line).map_err(|e| Error::MalformedInput {
                line: line_no,
                reason: e.to_string(),
            })?;

            if let Some(filter) = self.filter
                && !filter.matches(&record)
            {
                stats.filtered += 1;
                continue;
            }

            let emission = self.emitter.emit(&record, &mut tracker, line_no)?;
            sink.write_all(emission.render().as_bytes())
                .map_err(|e| Error::io(&self.sink_name, e))?;

            trace!(
                line = line_no,
                triples = emission.len(),
                new_actor = emission.new_actor,
                new_object = emission.new_object,
                "Record emitted"
            );
            stats.emitted += 1;
            stats.triples += emission.len();
        }

        sink.flush().map_err(|e| Error::io(&self.sink_name, e))?;

        stats.actors_declared = tracker.actors();
        stats.objects_declared = tracker.objects();
        Ok(stats)
    }
}

/// Run one stream pass without a cancellation source.
pub fn run<R: BufRead, W: Write>(
    source: R,
    sink: &mut W,
    filter: Option<&FilterSpec>,
) -> Result<IngestStats> {
    Driver::new(filter).run(source, sink)
}
