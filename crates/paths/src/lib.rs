#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `paths` turns user supplied path operands into absolute, canonical paths and
//! checks that they are usable as backup sources or targets. Every command of
//! the backup manager routes its operands through this crate before any worker
//! is started or any file is touched.
//!
//! # Design
//!
//! - [`canonicalize`] resolves symlinks and `.`/`..` segments. Unlike
//!   [`std::fs::canonicalize`] it accepts paths whose trailing components do not
//!   exist yet: the deepest existing ancestor is resolved and the missing
//!   components are appended literally, which lets a target directory be named
//!   before it is created.
//! - [`validate_source`] and [`validate_target`] enforce the directory
//!   requirements of the two roles. Target validation creates missing
//!   directories with mode `0755`.
//! - [`is_subpath`], [`ensure_not_nested`] and [`relocate`] implement the
//!   containment and root-substitution rules shared by the copier, the change
//!   watcher and the registry.
//!
//! # Invariants
//!
//! - Returned paths are absolute and never end with a separator.
//! - Containment is evaluated component-wise, so `/data/projects` is not
//!   considered to live under `/data/proj`.
//!
//! # Examples
//!
//! ```
//! use paths::{is_subpath, relocate};
//! use std::path::Path;
//!
//! assert!(is_subpath(Path::new("/data/proj"), Path::new("/data/proj/sub")));
//! assert!(!is_subpath(Path::new("/data/proj"), Path::new("/data/projects")));
//!
//! let moved = relocate(
//!     Path::new("/data/proj/a.txt"),
//!     Path::new("/data/proj"),
//!     Path::new("/backup/proj1"),
//! );
//! assert_eq!(moved.as_deref(), Some(Path::new("/backup/proj1/a.txt")));
//! ```

mod canonical;
mod error;
mod validate;

#[cfg(test)]
mod tests;

pub use canonical::canonicalize;
pub use error::PathError;
pub use validate::{is_dir_empty, validate_source, validate_target};

use std::path::{Path, PathBuf};

/// Reports whether `child` is `parent` itself or lives underneath it.
///
/// Both arguments are expected to be canonical; no filesystem access happens.
#[must_use]
pub fn is_subpath(parent: &Path, child: &Path) -> bool {
    child.starts_with(parent)
}

/// Rejects a target that equals or is nested inside its source.
pub fn ensure_not_nested(source: &Path, target: &Path) -> Result<(), PathError> {
    if is_subpath(source, target) {
        return Err(PathError::Nested {
            source_root: source.to_path_buf(),
            target: target.to_path_buf(),
        });
    }
    Ok(())
}

/// Maps `path` from underneath `from_root` to the same relative location under
/// `to_root`.
///
/// Returns `None` when `path` does not live under `from_root`. The root itself
/// maps onto `to_root`.
#[must_use]
pub fn relocate(path: &Path, from_root: &Path, to_root: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(from_root).ok()?;
    if relative.as_os_str().is_empty() {
        Some(to_root.to_path_buf())
    } else {
        Some(to_root.join(relative))
    }
}
