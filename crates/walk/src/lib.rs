#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` provides the deterministic traversal used by the backup copier when
//! it mirrors a source tree, prunes a replica, or restores a backup. Regular
//! files, directories, symbolic links and special files are all reported;
//! symbolic links are never followed.
//!
//! # Design
//!
//! - [`WalkBuilder`] configures the traversal root, whether the root entry
//!   itself should be emitted, and whether only directories are wanted (the
//!   watcher places one watch per directory and ignores everything else).
//! - [`Walker`] implements [`Iterator`] and yields [`WalkEntry`] values in
//!   depth-first order. Directory entries are sorted by name before they are
//!   yielded so traversal order does not depend on the filesystem.
//! - A directory is only opened when the iterator advances past it, which lets
//!   [`Walker::skip_current_dir`] drop a subtree the caller has already dealt
//!   with (for example one that was just removed).
//!
//! # Invariants
//!
//! - Every [`WalkEntry`] lives under the configured root and its relative path
//!   never contains `..`.
//! - Traversal never panics; failures are reported through [`WalkError`] and
//!   end the iteration.
//!
//! # Examples
//!
//! ```
//! use walk::WalkBuilder;
//! use std::fs;
//! use std::path::PathBuf;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let root = temp.path().join("src");
//! fs::create_dir_all(root.join("nested"))?;
//! fs::write(root.join("file.txt"), b"data")?;
//! fs::write(root.join("nested/more.txt"), b"data")?;
//!
//! let walker = WalkBuilder::new(&root).include_root(false).build()?;
//! let seen = walker
//!     .map(|entry| entry.map(|entry| entry.relative_path().to_path_buf()))
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! assert_eq!(
//!     seen,
//!     vec![
//!         PathBuf::from("file.txt"),
//!         PathBuf::from("nested"),
//!         PathBuf::from("nested/more.txt"),
//!     ]
//! );
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod builder;
mod entry;
mod error;
mod walker;

#[cfg(test)]
mod tests;

pub use builder::WalkBuilder;
pub use entry::{EntryKind, WalkEntry};
pub use error::WalkError;
pub use walker::Walker;
