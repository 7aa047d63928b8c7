use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walk::WalkError;

/// Error produced when copying, removing or pruning entries fails.
#[derive(Debug, Error)]
pub enum CopyError {
    /// Filesystem interaction failed.
    #[error("failed to {action} '{}': {source}", path.display())]
    Io {
        /// Action being performed.
        action: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Traversing a tree failed.
    #[error(transparent)]
    Walk(#[from] WalkError),
    /// The stop flag was raised before the copy finished.
    #[error("copy cancelled")]
    Cancelled,
}

impl CopyError {
    /// Constructs an I/O error with action context.
    #[must_use]
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Returns the path the failure refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
            Self::Walk(error) => error.path(),
            Self::Cancelled => Path::new(""),
        }
    }

    /// Reports whether the failure was caused by a missing entry.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            Self::Walk(error) => error.is_not_found(),
            Self::Cancelled => false,
        }
    }

    /// Reports whether the copy stopped because it was asked to.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error produced when restoring a source from its backup fails.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// The backup directory does not exist.
    #[error("backup directory does not exist: {}", path.display())]
    BackupMissing {
        /// Backup root handed to the restore.
        path: PathBuf,
    },
    /// The backup root is not a directory.
    #[error("backup is not a directory: {}", path.display())]
    BackupNotDirectory {
        /// Backup root handed to the restore.
        path: PathBuf,
    },
    /// Fingerprinting a file failed.
    #[error("failed to fingerprint '{}': {source}", path.display())]
    Fingerprint {
        /// File being hashed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Copying or pruning failed.
    #[error(transparent)]
    Copy(#[from] CopyError),
}

impl From<WalkError> for RestoreError {
    fn from(error: WalkError) -> Self {
        Self::Copy(CopyError::Walk(error))
    }
}
