//! Error types for ecargraph.
//!
//! Uses `thiserror` for ergonomic error definitions. Every failure either
//! aborts the current run or, for filter evaluation, is absorbed as a
//! skipped record. There is no retry anywhere.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all ecargraph operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Startup configuration ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Input stream ---
    #[error("Malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    // --- Filesystem ---
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- Graph store collaborators ---
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Run cancelled")]
    Cancelled,
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was raised at startup before any work happened.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}

// --- Bounded context errors ---

/// Failures talking to the graph store or the bulk loader.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    #[error("Alter request failed: {message} (status: {status_code})")]
    Alter { status_code: u16, message: String },

    #[error("Graph store unreachable at {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("Failed to start bulk loader '{binary}': {reason}")]
    LoaderSpawn { binary: String, reason: String },

    #[error("Bulk loader exited with {status}")]
    LoaderFailed { status: String },
}

/// Typed field access failure on a decoded record.
///
/// Recoverable: the filter treats it as a non-match, the emitter turns it
/// into [`Error::MalformedInput`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field '{field}' is missing")]
    Missing { field: String },

    #[error("field '{field}' is {found}, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{field}' is empty")]
    Empty { field: String },
}
