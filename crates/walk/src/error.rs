use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a walk could not continue.
///
/// Each variant keeps the path being examined so callers can tell a vanished
/// subtree, which is routine in a live tree, from a real failure.
#[derive(Debug, Error)]
pub enum WalkError {
    /// `lstat` on the starting path failed.
    #[error("cannot stat walk root '{}': {source}", path.display())]
    RootMetadata {
        /// Starting path.
        path: PathBuf,
        /// OS error.
        source: io::Error,
    },
    /// A directory could not be listed.
    #[error("cannot list directory '{}': {source}", path.display())]
    ReadDir {
        /// Directory being opened.
        path: PathBuf,
        /// OS error.
        source: io::Error,
    },
    /// Listing stopped part way through a directory.
    #[error("cannot list entries of '{}': {source}", path.display())]
    ReadDirEntry {
        /// Directory being listed.
        path: PathBuf,
        /// OS error.
        source: io::Error,
    },
    /// `lstat` on a listed child failed for a reason other than removal.
    #[error("cannot stat '{}': {source}", path.display())]
    Metadata {
        /// Child path.
        path: PathBuf,
        /// OS error.
        source: io::Error,
    },
    /// A relative root was given and the working directory is unknown.
    #[error("cannot resolve relative walk root: {source}")]
    CurrentDir {
        /// OS error.
        source: io::Error,
    },
}

impl WalkError {
    /// Path involved in the failure; `.` when resolving a relative root.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RootMetadata { path, .. }
            | Self::ReadDir { path, .. }
            | Self::ReadDirEntry { path, .. }
            | Self::Metadata { path, .. } => path,
            Self::CurrentDir { .. } => Path::new("."),
        }
    }

    /// OS error behind the failure.
    #[must_use]
    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::RootMetadata { source, .. }
            | Self::ReadDir { source, .. }
            | Self::ReadDirEntry { source, .. }
            | Self::Metadata { source, .. }
            | Self::CurrentDir { source } => source,
        }
    }

    /// True when the path disappeared, e.g. a directory deleted mid-walk.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.io_error().kind() == io::ErrorKind::NotFound
    }
}
