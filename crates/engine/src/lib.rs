#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` performs every filesystem mutation of the backup manager: it copies
//! entries from a source tree into a mirror, removes entries that disappeared,
//! reconciles a whole mirror with its source, and restores a source from a
//! backup.
//!
//! # Design
//!
//! - [`copy_entry`] mirrors one entry (recursively for directories) and
//!   rewrites absolute symlinks that point inside the copy's source root so
//!   they point inside the destination root instead.
//! - [`remove_path`] and [`prune_extraneous`] delete what the reference tree no
//!   longer has.
//! - [`sync_tree`] combines the two into a full reconciliation, used for the
//!   initial mirror and whenever change notifications were lost.
//! - [`restore`] walks a backup and rewrites only what differs in the source,
//!   comparing regular files by length and XXH3 fingerprint.
//!
//! # Errors
//!
//! Failures surface as [`CopyError`] or [`RestoreError`], carrying the action
//! that failed and the path involved.

mod copy;
mod error;
mod remove;
mod restore;
mod sync;


pub use copy::{CopyRoots, copy_entry, sync_directory_permissions};
pub use error::{CopyError, RestoreError};
pub use remove::{prune_extraneous, remove_path};
pub use restore::{RestoreSummary, restore};
pub use sync::{SyncSummary, sync_tree};
