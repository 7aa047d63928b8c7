use engine::CopyError;
use thiserror::Error;
use watch::WatchError;

use crate::ExitCode;

/// Failure that ends a worker early.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The initial copy failed.
    #[error("initial synchronisation failed: {0}")]
    InitialSync(#[source] CopyError),
    /// Watching the source failed.
    #[error("cannot watch source: {0}")]
    Watch(#[from] WatchError),
}

impl WorkerError {
    /// Exit status matching the failure.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InitialSync(_) => ExitCode::InitialSync,
            Self::Watch(_) => ExitCode::WatchFailed,
        }
    }
}
