use std::io;
use std::path::PathBuf;

use engine::RestoreError;
use paths::PathError;
use thiserror::Error;

/// Error returned by registry commands.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A path operand was unusable.
    #[error(transparent)]
    Path(#[from] PathError),
    /// The pair is already being backed up.
    #[error("backup already active: {} -> {}", source_root.display(), target.display())]
    AlreadyActive {
        /// Canonical source directory.
        source_root: PathBuf,
        /// Canonical target directory.
        target: PathBuf,
    },
    /// Another active backup already writes into this target.
    #[error("target is already used by another backup: {}", target.display())]
    TargetInUse {
        /// Canonical target directory.
        target: PathBuf,
    },
    /// The same target was named twice in one command.
    #[error("target listed more than once: {}", target.display())]
    DuplicateTarget {
        /// Canonical target directory.
        target: PathBuf,
    },
    /// The worker process could not be started.
    #[error("cannot start worker for {}: {source}", target.display())]
    Launch {
        /// Target the worker was meant to serve.
        target: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The backup handed to restore does not exist.
    #[error("backup directory does not exist: {}", path.display())]
    BackupMissing {
        /// Canonical backup path.
        path: PathBuf,
    },
    /// The backup handed to restore is not a directory.
    #[error("backup is not a directory: {}", path.display())]
    BackupNotDirectory {
        /// Canonical backup path.
        path: PathBuf,
    },
    /// Source and backup overlap, so restoring would read its own output.
    #[error(
        "source and backup must not contain each other. Source: {} Backup: {}",
        source_root.display(),
        backup.display()
    )]
    Overlap {
        /// Canonical source directory.
        source_root: PathBuf,
        /// Canonical backup directory.
        backup: PathBuf,
    },
    /// Restoring failed part-way.
    #[error("restore failed: {0}")]
    Restore(#[from] RestoreError),
}
