//! # ecargraph Core
//!
//! The decision logic of the eCAR-to-RDF pipeline: decode a record, test it
//! against an optional filter, and emit the triples that describe an actor
//! acting on an object. Identity declarations are deduplicated per run by an
//! [`IdentityTracker`] that the caller owns.
//!
//! Nothing here does I/O; the ingest crate drives these pieces over a stream.

pub mod error;
pub mod filter;
pub mod identity;
pub mod record;
pub mod triple;

// Re-export key types at crate root for ergonomics
pub use error::{Error, FieldError, GraphError, Result};
pub use filter::FilterSpec;
pub use identity::IdentityTracker;
pub use record::AuditRecord;
pub use triple::{BlankNode, Emission, Term, Triple, TripleEmitter};
