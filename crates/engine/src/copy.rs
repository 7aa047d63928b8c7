//! crates/engine/src/copy.rs
//!
//! Mirrors single entries or whole subtrees from one root into another.

use std::fs::{self, DirBuilder, File, OpenOptions, Permissions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt, symlink};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};
use walk::{EntryKind, WalkBuilder};

use crate::error::CopyError;
use crate::remove::remove_path;

const COPY_BUFFER: usize = 64 * 1024;
const DIRECTORY_MODE: u32 = 0o755;
const PERMISSION_BITS: u32 = 0o7777;
const OWNER_RWX: u32 = 0o700;
const OWNER_WRITE: u32 = 0o200;

/// The pair of roots a copy runs between.
///
/// Absolute symlink targets that point under `from` are rewritten to the same
/// relative location under `to`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CopyRoots {
    from: PathBuf,
    to: PathBuf,
}

impl CopyRoots {
    /// Creates roots for copying from `from` into `to`.
    #[must_use]
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Root entries are copied from.
    #[must_use]
    pub fn from(&self) -> &Path {
        &self.from
    }

    /// Root entries are copied into.
    #[must_use]
    pub fn to(&self) -> &Path {
        &self.to
    }
}

/// Copies `src` to `dst`, recursing into directories.
///
/// Directories are created (or kept) and receive the source permission bits
/// once their whole subtree has been copied, so read-only directories can
/// still be filled. Regular files are fully rewritten. Symlinks are recreated
/// with their target rewritten through `roots`. Sockets, FIFOs and devices are
/// skipped. Whatever is in the way at the destination is replaced when its
/// type differs. Entries below `src` that vanish while the copy runs are
/// skipped.
pub fn copy_entry(src: &Path, dst: &Path, roots: &CopyRoots) -> Result<(), CopyError> {
    let mut pass = CopyPass::new(roots, None);
    pass.copy(src, dst)?;
    pass.finish()
}

/// One copy run: the roots it maps between, an optional stop flag, and the
/// directory modes still to apply.
pub(crate) struct CopyPass<'a> {
    roots: &'a CopyRoots,
    stop: Option<&'a AtomicBool>,
    deferred: Vec<(PathBuf, u32)>,
}

impl<'a> CopyPass<'a> {
    pub(crate) fn new(roots: &'a CopyRoots, stop: Option<&'a AtomicBool>) -> Self {
        Self {
            roots,
            stop,
            deferred: Vec::new(),
        }
    }

    pub(crate) fn copy(&mut self, src: &Path, dst: &Path) -> Result<(), CopyError> {
        let metadata =
            fs::symlink_metadata(src).map_err(|error| CopyError::io("inspect", src, error))?;
        match EntryKind::from_file_type(metadata.file_type()) {
            EntryKind::Directory => self.copy_directory(src, dst),
            EntryKind::File => copy_file(src, dst, metadata.permissions().mode()),
            EntryKind::Symlink => copy_symlink(src, dst, self.roots).map(|_| ()),
            EntryKind::Other => {
                debug!(target: "backup::copy", path = %src.display(), "skipping special file");
                Ok(())
            }
        }
    }

    fn copy_directory(&mut self, src: &Path, dst: &Path) -> Result<(), CopyError> {
        for entry in WalkBuilder::new(src).build()? {
            self.check_stop()?;
            let entry = entry?;
            let target = destination(dst, entry.relative_path());
            let mode = entry.metadata().permissions().mode();
            let copied = match entry.kind() {
                EntryKind::Directory => self.directory(&target, mode),
                EntryKind::File => copy_file(entry.full_path(), &target, mode),
                EntryKind::Symlink => {
                    copy_symlink(entry.full_path(), &target, self.roots).map(|_| ())
                }
                EntryKind::Other => {
                    debug!(
                        target: "backup::copy",
                        path = %entry.full_path().display(),
                        "skipping special file"
                    );
                    Ok(())
                }
            };
            match copied {
                Err(error) if vanished(&error, entry.full_path()) => {
                    trace!(target: "backup::copy", path = %entry.full_path().display(), "entry vanished");
                }
                other => other?,
            }
        }
        Ok(())
    }

    /// Makes `path` a directory the copy can write into and remembers `mode`
    /// for [`CopyPass::finish`].
    pub(crate) fn directory(&mut self, path: &Path, mode: u32) -> Result<(), CopyError> {
        ensure_directory(path)?;
        self.deferred.push((path.to_path_buf(), mode));
        Ok(())
    }

    pub(crate) fn check_stop(&self) -> Result<(), CopyError> {
        match self.stop {
            Some(stop) if stop.load(Ordering::Acquire) => Err(CopyError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Applies the remembered directory modes, deepest directories first.
    pub(crate) fn finish(self) -> Result<(), CopyError> {
        for (path, mode) in self.deferred.iter().rev() {
            match apply_permissions(path, *mode) {
                Err(error) if error.is_not_found() => {}
                other => other?,
            }
        }
        Ok(())
    }
}

/// Whether `error` only says that `entry`, on the reading side, disappeared.
pub(crate) fn vanished(error: &CopyError, entry: &Path) -> bool {
    error.is_not_found() && error.path() == entry
}

/// Joins `relative` onto `root`, mapping the empty path to `root` itself.
pub(crate) fn destination(root: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

/// Makes sure a directory the owner can fill exists at `path`.
fn ensure_directory(path: &Path) -> Result<(), CopyError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => {
            let mode = metadata.permissions().mode();
            if mode & OWNER_RWX != OWNER_RWX {
                apply_permissions(path, mode | OWNER_RWX)?;
            }
            Ok(())
        }
        Ok(_) => {
            remove_path(path)?;
            create_directory(path)
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => create_directory(path),
        Err(error) => Err(CopyError::io("inspect", path, error)),
    }
}

/// Re-applies the permission bits of `src` onto the existing directory `dst`.
pub fn sync_directory_permissions(src: &Path, dst: &Path) -> Result<(), CopyError> {
    let metadata = fs::symlink_metadata(src).map_err(|error| CopyError::io("inspect", src, error))?;
    if !metadata.is_dir() {
        return Ok(());
    }
    apply_permissions(dst, metadata.permissions().mode())
}

fn create_directory(path: &Path) -> Result<(), CopyError> {
    trace!(target: "backup::copy", path = %path.display(), "creating directory");
    DirBuilder::new()
        .recursive(true)
        .mode(DIRECTORY_MODE)
        .create(path)
        .map_err(|error| CopyError::io("create directory", path, error))
}

fn ensure_parent(path: &Path) -> Result<(), CopyError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => match fs::symlink_metadata(parent) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => {
                remove_path(parent)?;
                create_directory(parent)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => create_directory(parent),
            Err(error) => Err(CopyError::io("inspect", parent, error)),
        },
        _ => Ok(()),
    }
}

fn apply_permissions(path: &Path, mode: u32) -> Result<(), CopyError> {
    fs::set_permissions(path, Permissions::from_mode(mode & PERMISSION_BITS))
        .map_err(|error| CopyError::io("set permissions on", path, error))
}

/// A regular file the owner may reopen for writing. Anything else at the
/// destination is removed before a file is copied over it.
fn is_writable_file(metadata: &fs::Metadata) -> bool {
    metadata.is_file() && metadata.permissions().mode() & OWNER_WRITE != 0
}

/// Truncates `dst` and streams the bytes of `src` into it.
pub(crate) fn copy_file(src: &Path, dst: &Path, mode: u32) -> Result<(), CopyError> {
    ensure_parent(dst)?;
    match fs::symlink_metadata(dst) {
        Ok(metadata) if is_writable_file(&metadata) => {}
        Ok(_) => remove_path(dst)?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(CopyError::io("inspect", dst, error)),
    }

    let mut reader = File::open(src).map_err(|error| CopyError::io("open", src, error))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode((mode | OWNER_WRITE) & PERMISSION_BITS)
        .open(dst)
        .map_err(|error| CopyError::io("create", dst, error))?;

    let mut buffer = vec![0u8; COPY_BUFFER];
    let mut copied = 0u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(CopyError::io("read", src, error)),
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|error| CopyError::io("write", dst, error))?;
        copied += read as u64;
    }
    drop(writer);
    apply_permissions(dst, mode)?;

    trace!(
        target: "backup::copy",
        src = %src.display(),
        dst = %dst.display(),
        bytes = copied,
        "copied file"
    );
    Ok(())
}

/// Computes the target `dst` should point at when `src` is recreated there.
pub(crate) fn rewritten_link_target(src: &Path, roots: &CopyRoots) -> Result<PathBuf, CopyError> {
    let target = fs::read_link(src).map_err(|error| CopyError::io("read link", src, error))?;
    if target.is_absolute() {
        if let Some(rewritten) = paths::relocate(&target, &roots.from, &roots.to) {
            return Ok(rewritten);
        }
    }
    Ok(target)
}

/// Recreates the symlink `src` at `dst` and returns the target it was given.
pub(crate) fn copy_symlink(src: &Path, dst: &Path, roots: &CopyRoots) -> Result<PathBuf, CopyError> {
    let target = rewritten_link_target(src, roots)?;
    place_symlink(&target, dst)?;
    Ok(target)
}

pub(crate) fn place_symlink(target: &Path, dst: &Path) -> Result<(), CopyError> {
    ensure_parent(dst)?;
    remove_path(dst)?;
    symlink(target, dst).map_err(|error| CopyError::io("create symlink", dst, error))?;
    trace!(
        target: "backup::copy",
        link = %dst.display(),
        points_to = %target.display(),
        "created symlink"
    );
    Ok(())
}
