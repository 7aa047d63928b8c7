//! crates/engine/src/restore.rs
//!
//! Rebuilds a source directory from one of its backups.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use checksums::fingerprint_file;
use tracing::{debug, info};
use walk::{EntryKind, WalkBuilder, WalkEntry};

use crate::copy::{
    CopyPass, CopyRoots, copy_file, destination, place_symlink, rewritten_link_target, vanished,
};
use crate::error::{CopyError, RestoreError};
use crate::remove::prune_extraneous;

/// Counters describing what a restore changed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RestoreSummary {
    /// Files and symlinks rewritten from the backup.
    pub copied: u64,
    /// Files and symlinks that already matched the backup.
    pub skipped: u64,
    /// Entries removed from the source because the backup lacks them.
    pub removed: u64,
}

/// Makes `source_root` match `backup_root`.
///
/// Regular files whose length and content fingerprint already match are left
/// untouched, as are symlinks that already point at the expected target.
/// Absolute links into the backup are rewritten to point into the source.
/// The operation is best-effort: a failure leaves earlier changes in place.
pub fn restore(source_root: &Path, backup_root: &Path) -> Result<RestoreSummary, RestoreError> {
    match fs::metadata(backup_root) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(RestoreError::BackupNotDirectory {
                path: backup_root.to_path_buf(),
            });
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(RestoreError::BackupMissing {
                path: backup_root.to_path_buf(),
            });
        }
        Err(error) => return Err(CopyError::io("inspect", backup_root, error).into()),
    }

    let roots = CopyRoots::new(backup_root, source_root);
    let mut pass = CopyPass::new(&roots, None);
    let mut summary = RestoreSummary::default();

    for entry in WalkBuilder::new(backup_root).build()? {
        let entry = entry?;
        let target = destination(source_root, entry.relative_path());
        match restore_entry(&entry, &target, &roots, &mut pass) {
            Ok(Some(true)) => summary.copied += 1,
            Ok(Some(false)) => summary.skipped += 1,
            Ok(None) => {}
            Err(RestoreError::Copy(error)) if vanished(&error, entry.full_path()) => {
                debug!(target: "backup::restore", path = %entry.full_path().display(), "entry vanished");
            }
            Err(error) => return Err(error),
        }
    }

    summary.removed = prune_extraneous(backup_root, source_root)?;
    pass.finish()?;

    info!(
        target: "backup::restore",
        source = %source_root.display(),
        backup = %backup_root.display(),
        copied = summary.copied,
        skipped = summary.skipped,
        removed = summary.removed,
        "restore finished"
    );
    Ok(summary)
}

/// Brings one entry of the backup over. `Some(true)` means it was rewritten,
/// `Some(false)` that it already matched; directories and special files
/// yield `None`.
fn restore_entry(
    entry: &WalkEntry,
    target: &Path,
    roots: &CopyRoots,
    pass: &mut CopyPass<'_>,
) -> Result<Option<bool>, RestoreError> {
    let mode = entry.metadata().permissions().mode();
    match entry.kind() {
        EntryKind::Directory => {
            pass.directory(target, mode)?;
            Ok(None)
        }
        EntryKind::Symlink => {
            let link = rewritten_link_target(entry.full_path(), roots)?;
            if fs::read_link(target).is_ok_and(|existing| existing == link) {
                return Ok(Some(false));
            }
            place_symlink(&link, target)?;
            Ok(Some(true))
        }
        EntryKind::File => {
            if file_matches(entry, target)? {
                return Ok(Some(false));
            }
            copy_file(entry.full_path(), target, mode)?;
            Ok(Some(true))
        }
        EntryKind::Other => {
            debug!(
                target: "backup::restore",
                path = %entry.full_path().display(),
                "skipping special file"
            );
            Ok(None)
        }
    }
}

fn file_matches(entry: &WalkEntry, target: &Path) -> Result<bool, RestoreError> {
    let existing = match fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(CopyError::io("inspect", target, error).into()),
    };
    if !existing.is_file() || existing.len() != entry.metadata().len() {
        return Ok(false);
    }

    let fingerprint = |path: &Path| {
        fingerprint_file(path).map_err(|source| RestoreError::Fingerprint {
            path: path.to_path_buf(),
            source,
        })
    };
    if fingerprint(entry.full_path())? != fingerprint(target)? {
        return Ok(false);
    }

    let mode = entry.metadata().permissions().mode() & 0o7777;
    if existing.permissions().mode() & 0o7777 != mode {
        fs::set_permissions(target, fs::Permissions::from_mode(mode))
            .map_err(|error| CopyError::io("set permissions on", target, error))?;
    }
    Ok(true)
}
