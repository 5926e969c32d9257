//! Graph store collaborators for ecargraph.
//!
//! - **Schema**: install the eCAR predicate schema or drop all data
//! - **Loader**: hand a converted triple file to `dgraph live`
//!
//! Neither reimplements the store; both are thin, logged wrappers.

pub mod loader;
pub mod schema;

pub use loader::{LiveLoader, LoadReport};
pub use schema::{DgraphHttpAdmin, SCHEMA, SchemaAdmin};
