#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `watch` turns Linux inotify notifications for a whole directory tree into
//! [`ChangeEvent`] values carrying absolute paths. A backup worker owns one
//! [`WatchSet`] over its source and replays every event against its target.
//!
//! # Design
//!
//! - inotify watches are per directory, so [`WatchSet::watch_directory_tree`]
//!   registers the root and each subdirectory. The worker calls it again for
//!   directories created or moved in later.
//! - Deleting or moving a directory away drops the watches of its whole
//!   subtree. Self events on non-root directories and events for handles the
//!   set no longer knows are dropped, because the parent's entry event already
//!   covers them.
//! - [`WatchSet::next_events`] blocks in `poll(2)` with a bounded timeout and
//!   checks a shutdown flag between waits, which keeps cancellation latency at
//!   one poll interval without any global state.

mod error;
mod event;
mod set;

#[cfg(test)]
mod tests;

pub use error::WatchError;
pub use event::{ChangeEvent, ChangeKind, EventBatch};
pub use set::WatchSet;
