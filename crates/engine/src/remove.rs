use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};
use walk::{EntryKind, WalkBuilder};

use crate::copy::destination;
use crate::error::CopyError;

/// Removes `path` recursively. A missing path is not an error and symlinks are
/// removed rather than followed.
pub fn remove_path(path: &Path) -> Result<(), CopyError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(CopyError::io("inspect", path, error)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).or_else(|error| {
            if error.kind() != io::ErrorKind::PermissionDenied {
                return Err(error);
            }
            debug!(target: "backup::copy", path = %path.display(), "unlocking read-only tree");
            unlock_tree(path)?;
            fs::remove_dir_all(path)
        })
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => {
            trace!(target: "backup::copy", path = %path.display(), "removed");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(CopyError::io("remove", path, error)),
    }
}

/// Deletes every entry under `replica` that has no counterpart of a
/// compatible kind under `reference`, and returns how many top-level
/// removals were made.
///
/// Directories only match directories; files and symlinks are left for the
/// copier to overwrite.
pub fn prune_extraneous(reference: &Path, replica: &Path) -> Result<u64, CopyError> {
    prune_until(reference, replica, None)
}

/// [`prune_extraneous`] that gives up with [`CopyError::Cancelled`] once
/// `stop` is raised.
pub(crate) fn prune_until(
    reference: &Path,
    replica: &Path,
    stop: Option<&AtomicBool>,
) -> Result<u64, CopyError> {
    let mut walker = WalkBuilder::new(replica).include_root(false).build()?;
    let mut removed = 0u64;

    while let Some(entry) = walker.next() {
        if stop.is_some_and(|stop| stop.load(Ordering::Acquire)) {
            return Err(CopyError::Cancelled);
        }
        let entry = entry?;
        let counterpart = destination(reference, entry.relative_path());
        let keep = match fs::symlink_metadata(&counterpart) {
            Ok(metadata) => metadata.is_dir() == (entry.kind() == EntryKind::Directory),
            Err(error) if error.kind() == io::ErrorKind::NotFound => false,
            Err(error) => return Err(CopyError::io("inspect", counterpart, error)),
        };
        if keep {
            continue;
        }

        debug!(
            target: "backup::copy",
            path = %entry.full_path().display(),
            "pruning entry absent from reference"
        );
        walker.skip_current_dir();
        remove_path(entry.full_path())?;
        removed += 1;
    }

    Ok(removed)
}

/// Grants the owner full access to every directory under `root` so that its
/// contents can be deleted.
fn unlock_tree(root: &Path) -> io::Result<()> {
    let walker = WalkBuilder::new(root)
        .directories_only(true)
        .build()
        .map_err(|error| io::Error::new(error.io_error().kind(), error))?;
    for entry in walker {
        let entry = entry.map_err(|error| io::Error::new(error.io_error().kind(), error))?;
        let mode = entry.metadata().permissions().mode();
        fs::set_permissions(entry.full_path(), fs::Permissions::from_mode(mode | 0o700))?;
    }
    Ok(())
}
