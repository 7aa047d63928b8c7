use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error returned when a path operand cannot be used.
#[derive(Debug, Error)]
pub enum PathError {
    /// The path (or every one of its ancestors) does not exist.
    #[error("cannot find directory: {}", path.display())]
    NotFound {
        /// Offending path.
        path: PathBuf,
    },
    /// The path exists but is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },
    /// The target directory already holds entries.
    #[error("target directory is not empty: {}", path.display())]
    NotEmpty {
        /// Offending path.
        path: PathBuf,
    },
    /// The missing target directory chain could not be created.
    #[error("cannot create directory {}: {source}", path.display())]
    CreateFailed {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// The target would live inside its own source.
    #[error(
        "cannot create backup inside source. Source: {} Target: {}",
        source_root.display(),
        target.display()
    )]
    Nested {
        /// Canonical source directory.
        source_root: PathBuf,
        /// Canonical target directory.
        target: PathBuf,
    },
    /// Any other filesystem failure while inspecting the path.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        /// Short description of the attempted operation.
        action: &'static str,
        /// Path being inspected.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
}

impl PathError {
    pub(crate) fn io(action: &'static str, path: PathBuf, source: io::Error) -> Self {
        Self::Io {
            action,
            path,
            source,
        }
    }

    /// Returns the path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path }
            | Self::NotADirectory { path }
            | Self::NotEmpty { path }
            | Self::CreateFailed { path, .. }
            | Self::Io { path, .. } => path,
            Self::Nested { target, .. } => target,
        }
    }
}
