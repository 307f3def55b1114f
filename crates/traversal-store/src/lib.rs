//! Traversal Store (C3): in-memory and on-disk representation of a run,
//! with incremental atomic writes (§4.3).

mod errors;
mod layout;
mod observer;
mod store;

pub use errors::TraversalStoreError;
pub use layout::{screenshot_dir, screenshot_file_name, screenshot_path, traversal_file_name};
pub use observer::{NoopObserver, ProgressObserver, TraversalEvent};
pub use store::{read_traversal, ReadOutcome, TraversalMeta, TraversalStore};
