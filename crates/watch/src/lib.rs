//! Directory watch pipeline for ecargraph.
//!
//! New `.json` / `.json.gz` files in a watched directory are converted and
//! bulk-loaded one at a time. Each file gets its own identity tracker; the
//! loader's xidmap is what coalesces identities across files.

pub mod pipeline;
pub mod watcher;

pub use pipeline::{ConvertAndLoad, FileHandler, Outcome, convert_blocking};
pub use watcher::{
    DirWatcher, SETTLE_INTERVAL, WatchError, WatchSummary, ingestible_creations, process_queue,
    wait_until_settled,
};
