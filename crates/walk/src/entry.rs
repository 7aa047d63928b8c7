use std::fs;
use std::path::{Path, PathBuf};

/// What a walked path is, judged from `lstat` so links stay links.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// Directory; the walker descends into it.
    Directory,
    /// Regular file.
    File,
    /// Symbolic link, recreated rather than followed.
    Symlink,
    /// Socket, FIFO or device node. Backups skip these.
    Other,
}

impl EntryKind {
    /// Maps a file type obtained without following links.
    #[must_use]
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// One path produced by [`Walker`](crate::Walker).
#[derive(Debug)]
pub struct WalkEntry {
    pub(crate) full_path: PathBuf,
    pub(crate) relative_path: PathBuf,
    pub(crate) metadata: fs::Metadata,
    pub(crate) depth: usize,
    pub(crate) is_root: bool,
}

impl WalkEntry {
    /// Absolute location of the entry.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Location below the walked root, used to mirror the entry into another
    /// tree. The root itself has an empty relative path.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// `lstat` result taken when the entry was reached. It may be stale by
    /// the time the caller looks at it.
    #[must_use]
    pub fn metadata(&self) -> &fs::Metadata {
        &self.metadata
    }

    /// Kind of the entry.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        EntryKind::from_file_type(self.metadata.file_type())
    }

    /// Number of path components below the root.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// True only for the first entry of a walk that includes its root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.is_root
    }
}
