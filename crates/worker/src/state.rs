use std::fmt;

/// Lifecycle of a worker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkerState {
    /// Configuration received, nothing touched yet.
    Starting,
    /// Copying the source into the target.
    InitialSync,
    /// Replaying change events.
    Watching,
    /// Releasing watches after a stop request or source removal.
    Terminating,
    /// Finished.
    Terminated,
}

impl WorkerState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::InitialSync => "initial-sync",
            Self::Watching => "watching",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
