use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error produced by the change watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The inotify instance could not be created.
    #[error("failed to initialise inotify: {source}")]
    Init {
        /// Underlying error.
        source: io::Error,
    },
    /// A directory could not be placed under watch.
    #[error("failed to watch '{}': {source}", path.display())]
    Add {
        /// Directory that could not be watched.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Traversing a directory to place watches failed.
    #[error("failed to scan '{}' for watching: {source}", path.display())]
    Scan {
        /// Directory being scanned.
        path: PathBuf,
        /// Underlying error.
        source: walk::WalkError,
    },
    /// Waiting for or reading events failed.
    #[error("failed to read change events: {source}")]
    Channel {
        /// Underlying error.
        source: io::Error,
    },
}
